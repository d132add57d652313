pub mod error;
pub mod game;
pub mod session;
pub mod simulate;
pub mod sink;
pub mod strategy;

use serde::{Deserialize, Serialize};
use serde_enum_str::{Deserialize_enum_str, Serialize_enum_str};

pub use error::{GameError, GameResult};
pub use game::{Game, GameState};

/// The rule knobs of a table, fixed for the lifetime of a `Game`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct GameRules {
    pub min_bet: f64,
    pub max_bet: f64,
    pub number_of_decks: u8,
    /// Reshuffle once the shoe holds at most this percentage of its full size.
    pub reset_percentage: f64,
    pub payout_blackjack: f64,
    pub dealer_hits_soft_seventeen: bool,
    pub double_policy: DoublePolicy,
    pub double_first_two_only: bool,
    pub double_after_split: bool,
    pub double_after_split_aces: bool,
    /// Upper bound on the number of hands one player may hold after splits.
    pub max_hands: usize,
    pub hit_split_aces: bool,
    pub allow_early_surrender: bool,
    pub allow_late_surrender: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize_enum_str, Deserialize_enum_str)]
pub enum DoublePolicy {
    AnyTwo,
    NineTenElevenOnly,
    TenElevenOnly,
}

/// A play a seated player can make on one hand.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum PlayerDecision {
    PlaceHolder,
    Hit,
    Stand,
    Double,
    Split,
    Surrender,
}

impl Default for PlayerDecision {
    fn default() -> Self {
        PlayerDecision::PlaceHolder
    }
}
