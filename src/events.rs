//! Observable game events for external indexers and tests.
//!
//! Events are fanned out over a `tokio::sync::broadcast` channel; emission
//! never blocks and never fails, subscribers that lag simply miss events.

use crate::game::{AccountId, GameId};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

/// Everything externally observable about game lifecycles.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum GameEvent {
    MaxTargetScoreChanged {
        old: u32,
        new: u32,
    },
    GameCreated {
        game_id: GameId,
        target_score: u32,
        blind: u64,
    },
    Bet {
        game_id: GameId,
        player: AccountId,
        amount: u64,
    },
    Prediction {
        game_id: GameId,
        round: u64,
        player: AccountId,
        prediction: u8,
    },
    Roll {
        game_id: GameId,
        round: u64,
        rolled: u8,
    },
    GameEnded {
        game_id: GameId,
        winner: AccountId,
        payout: u64,
    },
}

/// Broadcast hub owned by the engine.
pub struct EventHub {
    sender: broadcast::Sender<GameEvent>,
}

impl EventHub {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<GameEvent> {
        self.sender.subscribe()
    }

    /// Emit an event to all current subscribers. A send error only means
    /// nobody is listening, which is fine.
    pub fn emit(&self, event: GameEvent) {
        tracing::debug!(?event, "emitting game event");
        let _ = self.sender.send(event);
    }
}
