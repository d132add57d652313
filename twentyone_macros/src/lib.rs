use proc_macro::TokenStream as TokenStream1;
use quote::{quote, ToTokens};
use syn::punctuated::Punctuated;
use syn::{parse_macro_input, Ident, Token};

/// This macro is added before a method of the `Game` struct in the impl block.
/// Use this macro to first check that the current game state is one of the
/// states listed in the attribute.
///
/// For example, `#[allowed_state(Betting)]` will make a method first check
/// if the current game state is `Betting`. If not, the method returns an
/// `InvalidState` error naming the method and the actual state. Several
/// states may be listed, e.g. `#[allowed_state(EarlySurrender, LateSurrender)]`.
#[proc_macro_attribute]
pub fn allowed_state(attr: TokenStream1, item: TokenStream1) -> TokenStream1 {
    let states = parse_macro_input!(attr with Punctuated::<Ident, Token![,]>::parse_terminated);
    let mut ast: syn::ImplItemFn = syn::parse(item).unwrap();
    let function_name = ast.sig.ident.to_string();
    let states = states.iter();
    let early_return: proc_macro2::TokenStream = quote! {
        if !matches!(self.state, #(GameState::#states)|*) {
            return Err(GameError::InvalidState {
                op: #function_name,
                state: self.state,
            });
        }
    };
    let early_return: syn::Stmt = syn::parse2(early_return).unwrap();
    ast.block.stmts.insert(0, early_return);
    ast.into_token_stream().into()
}
