pub mod pawn;

pub use pawn::common::error::PawnError;
pub use pawn::service::engine::{EngineInput, EngineOptions, EngineOutput, TiebreakEngine};
