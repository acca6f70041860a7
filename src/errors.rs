//! Error types for the dicepool engine.
//!
//! Every rejected call maps to exactly one variant and leaves no observable
//! state change behind. Oracle fulfillments that arrive late or for an
//! unknown request are deliberately *not* errors (no caller is waiting on
//! them); they are discarded no-ops, see [`crate::engine::FulfillOutcome`].

use crate::game::{GameId, GameState};
use crate::oracle::OracleError;

/// Convenience alias used throughout the crate.
pub type EngineResult<T> = Result<T, EngineError>;

/// Engine-level error taxonomy.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// Admin-gated operation invoked by a non-admin caller.
    #[error("caller is not the admin")]
    Unauthorized,

    #[error("game {0} is not created")]
    GameNotFound(GameId),

    #[error("blind must be greater than zero")]
    BlindZero,

    #[error("contribution {contribution} does not cover the blind {blind}")]
    ContributionBelowBlind { contribution: u64, blind: u64 },

    #[error("target score must be at least 1")]
    TargetScoreZero,

    #[error("target score {requested} exceeds the allowed maximum {ceiling}")]
    TargetScoreTooHigh { requested: u32, ceiling: u32 },

    #[error("already joined this game")]
    AlreadyJoined,

    #[error("at least two players are required to play")]
    NotEnoughPlayers,

    #[error("prediction must be between 1 and 6, got {0}")]
    PredictionOutOfRange(u8),

    #[error("it is not your turn")]
    NotYourTurn,

    /// Operation not valid for the game's current lifecycle state, e.g.
    /// predicting while a roll is still waiting on the oracle, or betting on
    /// an ended game.
    #[error("invalid game state: {0}")]
    InvalidState(GameState),

    #[error("randomness request failed: {0}")]
    Oracle(#[from] OracleError),
}
