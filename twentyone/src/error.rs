use crate::game::GameState;
use thiserror::Error;

pub type GameResult<T> = Result<T, GameError>;

/// Recoverable caller errors. Internal invariant violations (drawing from an
/// empty shoe, an unhandled hand result, bucket drift) panic instead, since
/// continuing would corrupt aggregate statistics.
#[derive(Debug, Error, PartialEq)]
pub enum GameError {
    #[error("unknown game session {0}")]
    InvalidSession(u64),

    #[error("unknown player {0}")]
    UnknownPlayer(u64),

    #[error("{op} is not allowed in the {state:?} state")]
    InvalidState { op: &'static str, state: GameState },

    #[error("illegal play: {0}")]
    IllegalPlay(&'static str),
}
