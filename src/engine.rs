//! Engine facade: game registry, escrow and oracle wiring.
//!
//! All player- and admin-facing operations enter here. Per-game mutations go
//! through the game table's entry guards, so every call is serialized against
//! other calls touching the same game; the only suspension point is the gap
//! between submitting a randomness request and receiving its fulfillment,
//! which arrives later as an independent [`DiceEngine::fulfill_randomness`]
//! call.

use crate::config::EngineConfig;
use crate::errors::{EngineError, EngineResult};
use crate::events::{EventHub, GameEvent};
use crate::game::{AccountId, Game, GameId, GameSnapshot, GameState, RollOutcome, DIE_FACES};
use crate::ledger::Ledger;
use crate::oracle::{RandomnessOracle, RequestId, RollRequest};
use crate::pending::{PendingRoll, PendingRollPool};
use dashmap::DashMap;
use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::broadcast;
use uuid::Uuid;

/// What a randomness fulfillment did.
///
/// `Ignored` covers every way a callback can miss: unknown request id,
/// duplicate delivery, a round the game has moved past, or a game that is no
/// longer waiting. None of these mutate any state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FulfillOutcome {
    Applied {
        game_id: GameId,
        rolled: u8,
        outcome: RollOutcome,
    },
    Ignored,
}

pub struct DiceEngine {
    admin: AccountId,
    max_target_score: AtomicU32,
    games: DashMap<GameId, Game>,
    /// Count of games ever created; the next game id.
    counter: AtomicU64,
    pending: PendingRollPool,
    ledger: Ledger,
    oracle: Arc<dyn RandomnessOracle>,
    events: EventHub,
}

impl DiceEngine {
    pub fn new(
        config: EngineConfig,
        admin: impl Into<AccountId>,
        oracle: Arc<dyn RandomnessOracle>,
    ) -> Self {
        Self {
            admin: admin.into(),
            max_target_score: AtomicU32::new(config.max_target_score),
            games: DashMap::new(),
            counter: AtomicU64::new(0),
            pending: PendingRollPool::new(),
            ledger: Ledger::new(),
            oracle,
            events: EventHub::new(config.event_capacity),
        }
    }

    fn require_admin(&self, caller: &str) -> EngineResult<()> {
        if caller != self.admin {
            return Err(EngineError::Unauthorized);
        }
        Ok(())
    }

    /// Create a game in the betting phase with the caller as sole player and
    /// their contribution as the opening pool.
    pub fn create_game(
        &self,
        caller: &str,
        target_score: u32,
        blind: u64,
        contribution: u64,
    ) -> EngineResult<GameId> {
        if blind == 0 {
            return Err(EngineError::BlindZero);
        }
        if contribution < blind {
            return Err(EngineError::ContributionBelowBlind {
                contribution,
                blind,
            });
        }
        if target_score == 0 {
            return Err(EngineError::TargetScoreZero);
        }
        let ceiling = self.max_target_score.load(Ordering::SeqCst);
        if target_score > ceiling {
            return Err(EngineError::TargetScoreTooHigh {
                requested: target_score,
                ceiling,
            });
        }

        let game_id = self.counter.fetch_add(1, Ordering::SeqCst);
        self.ledger.open_pool(game_id, contribution);
        self.games.insert(
            game_id,
            Game::new(game_id, caller.to_string(), target_score, blind),
        );
        self.events.emit(GameEvent::GameCreated {
            game_id,
            target_score,
            blind,
        });
        tracing::info!(game_id, creator = caller, target_score, blind, contribution, "game created");
        Ok(game_id)
    }

    /// Join a betting-phase game with a contribution of at least the blind.
    pub fn bet(&self, caller: &str, game_id: GameId, contribution: u64) -> EngineResult<()> {
        let mut game = self
            .games
            .get_mut(&game_id)
            .ok_or(EngineError::GameNotFound(game_id))?;
        game.join(caller, contribution)?;
        self.ledger.add_to_pool(game_id, contribution);
        drop(game);

        self.events.emit(GameEvent::Bet {
            game_id,
            player: caller.to_string(),
            amount: contribution,
        });
        tracing::info!(game_id, player = caller, amount = contribution, "bet accepted");
        Ok(())
    }

    /// Predict a die face and request the roll from the oracle.
    ///
    /// The call returns as soon as the request is handed to the oracle; the
    /// game sits in `Waiting` until [`Self::fulfill_randomness`] resolves
    /// the attempt. If the oracle refuses the submission the attempt is
    /// rolled back and the call fails with no observable side effect.
    pub async fn predict_and_roll(
        &self,
        caller: &str,
        game_id: GameId,
        prediction: u8,
    ) -> EngineResult<()> {
        let request = {
            let mut game = self
                .games
                .get_mut(&game_id)
                .ok_or(EngineError::GameNotFound(game_id))?;
            let round = game.begin_attempt(caller, prediction)?;
            let request = RollRequest {
                id: Uuid::new_v4(),
                game_id,
                round,
            };
            self.pending.register(
                request.id,
                PendingRoll {
                    game_id,
                    round,
                },
            );
            request
        };

        if let Err(err) = self.oracle.submit(request.clone()).await {
            // Roll the attempt back unless a fulfillment already raced us.
            if self.pending.take(&request.id).is_some() {
                if let Some(mut game) = self.games.get_mut(&game_id) {
                    game.abort_attempt();
                }
                tracing::warn!(game_id, error = %err, "randomness submission failed, attempt aborted");
                return Err(err.into());
            }
            tracing::debug!(game_id, "submission error arrived after fulfillment, ignoring");
            return Ok(());
        }

        self.events.emit(GameEvent::Prediction {
            game_id,
            round: request.round,
            player: caller.to_string(),
            prediction,
        });
        tracing::info!(
            game_id,
            round = request.round,
            player = caller,
            prediction,
            request_id = %request.id,
            "roll requested"
        );
        Ok(())
    }

    /// Oracle callback delivering the random value for a request.
    ///
    /// Unknown, duplicate and stale-round deliveries are discarded without
    /// touching any game; no caller is waiting on them, so they are not
    /// surfaced as errors.
    pub fn fulfill_randomness(&self, request_id: RequestId, random_value: u64) -> FulfillOutcome {
        let Some(pending) = self.pending.take(&request_id) else {
            tracing::debug!(%request_id, "fulfillment for unknown request discarded");
            return FulfillOutcome::Ignored;
        };

        let Some(mut game) = self.games.get_mut(&pending.game_id) else {
            tracing::warn!(%request_id, game_id = pending.game_id, "fulfillment for missing game discarded");
            return FulfillOutcome::Ignored;
        };

        if game.state() != GameState::Waiting || game.round() != pending.round {
            tracing::warn!(
                %request_id,
                game_id = pending.game_id,
                recorded_round = pending.round,
                live_round = game.round(),
                state = %game.state(),
                "stale fulfillment discarded"
            );
            return FulfillOutcome::Ignored;
        }

        let die = (random_value % u64::from(DIE_FACES)) as u8 + 1;
        self.events.emit(GameEvent::Roll {
            game_id: pending.game_id,
            round: pending.round,
            rolled: die,
        });

        let outcome = game.resolve(die);
        match &outcome {
            RollOutcome::Won { winner, score } => {
                // Payout commits in the same serialized step as the Ended
                // transition; the pool entry is gone before the guard drops.
                let payout = self.ledger.payout(pending.game_id, winner);
                let winner = winner.clone();
                tracing::info!(game_id = pending.game_id, %winner, score = *score, payout, "game ended");
                drop(game);
                self.events.emit(GameEvent::GameEnded {
                    game_id: pending.game_id,
                    winner,
                    payout,
                });
            }
            RollOutcome::Scored { player, score } => {
                tracing::info!(game_id = pending.game_id, %player, score = *score, rolled = die, "correct prediction");
            }
            RollOutcome::TurnPassed { next } => {
                tracing::info!(game_id = pending.game_id, rolled = die, %next, "turn passed");
            }
        }

        FulfillOutcome::Applied {
            game_id: pending.game_id,
            rolled: die,
            outcome,
        }
    }

    /// Public read of a game's projection.
    pub fn game(&self, game_id: GameId) -> Option<GameSnapshot> {
        self.games
            .get(&game_id)
            .map(|game| game.snapshot(self.ledger.pool(game_id)))
    }

    /// Count of games ever created. Admin-only.
    pub fn game_counter(&self, caller: &str) -> EngineResult<u64> {
        self.require_admin(caller)?;
        Ok(self.counter.load(Ordering::SeqCst))
    }

    pub fn max_target_score(&self) -> u32 {
        self.max_target_score.load(Ordering::SeqCst)
    }

    /// Change the target-score ceiling used by `create_game`. Admin-only.
    pub fn set_max_target_score(&self, caller: &str, value: u32) -> EngineResult<()> {
        self.require_admin(caller)?;
        if value == 0 {
            return Err(EngineError::TargetScoreZero);
        }
        let old = self.max_target_score.swap(value, Ordering::SeqCst);
        self.events
            .emit(GameEvent::MaxTargetScoreChanged { old, new: value });
        tracing::info!(old, new = value, "max target score changed");
        Ok(())
    }

    pub fn subscribe(&self) -> broadcast::Receiver<GameEvent> {
        self.events.subscribe()
    }

    pub fn balance_of(&self, account: &str) -> u64 {
        self.ledger.balance_of(account)
    }

    /// Sum of all open pools.
    pub fn total_escrowed(&self) -> u64 {
        self.ledger.total_escrowed()
    }
}
