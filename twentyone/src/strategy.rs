pub mod basic;
pub mod betting;
pub mod counting;

pub use basic::BasicStrategyEngine;
pub use betting::BetSpread;
pub use counting::CardCountingEngine;
