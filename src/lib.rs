//! Dicepool - turn-based dice-betting engine
//!
//! Players escrow a blind into a per-game pool, then take turns predicting a
//! die face. Rolls are resolved by an external randomness oracle through an
//! asynchronous request/fulfill protocol; the first player to reach the
//! game's target score wins the pool.

pub mod config;
pub mod engine;
pub mod errors;
pub mod events;
pub mod game;
pub mod ledger;
pub mod oracle;
pub mod pending;

pub use config::EngineConfig;
pub use engine::{DiceEngine, FulfillOutcome};
pub use errors::{EngineError, EngineResult};
pub use events::GameEvent;
pub use game::{AccountId, GameId, GameSnapshot, GameState, RollOutcome, DIE_FACES};
pub use oracle::{ChannelOracle, RandomnessOracle, RecordingOracle, RollRequest, SilentOracle};
