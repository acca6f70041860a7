//! Per-game lifecycle state machine.
//!
//! A [`Game`] moves through `Betting -> (Playing <-> Waiting)* -> Ended`.
//! Betting closes when the first prediction is made; from then on the game
//! alternates between `Playing` (somebody may predict) and `Waiting` (a roll
//! is outstanding at the oracle). `Ended` is terminal and kept for reads.
//!
//! This module is pure state: escrow movement, pending-request bookkeeping
//! and event emission live in [`crate::engine`].

use crate::errors::{EngineError, EngineResult};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Caller identity as supplied by the surrounding execution environment.
pub type AccountId = String;

/// Registry-assigned game identifier; monotonic, never reused.
pub type GameId = u64;

/// A standard die. Predictions and rolls are faces in `1..=DIE_FACES`.
pub const DIE_FACES: u8 = 6;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GameState {
    /// Accepting new players; the round-0 prediction is made from here.
    Betting,
    /// The player at `turn` may predict and roll.
    Playing,
    /// A randomness request is outstanding; no player calls are accepted.
    Waiting,
    /// A player reached the target score and the pool has been paid out.
    Ended,
}

impl fmt::Display for GameState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GameState::Betting => write!(f, "betting"),
            GameState::Playing => write!(f, "playing"),
            GameState::Waiting => write!(f, "waiting"),
            GameState::Ended => write!(f, "ended"),
        }
    }
}

/// What a resolved roll did to the game.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RollOutcome {
    /// Correct prediction reached the target score; the game is over.
    Won { winner: AccountId, score: u32 },
    /// Correct prediction; the same player keeps the turn.
    Scored { player: AccountId, score: u32 },
    /// Wrong prediction; the turn passed to the next player.
    TurnPassed { next: AccountId },
}

#[derive(Debug)]
pub struct Game {
    id: GameId,
    creator: AccountId,
    target_score: u32,
    blind: u64,
    state: GameState,
    /// Insertion order is turn order; append-only while betting.
    players: Vec<AccountId>,
    scores: HashMap<AccountId, u32>,
    turn: usize,
    /// Prediction/roll attempts resolved so far; the attempt currently in
    /// flight carries this value as its round.
    round: u64,
    pending_prediction: Option<u8>,
    created_at: DateTime<Utc>,
}

impl Game {
    pub fn new(id: GameId, creator: AccountId, target_score: u32, blind: u64) -> Self {
        let mut scores = HashMap::new();
        scores.insert(creator.clone(), 0);
        Self {
            id,
            creator: creator.clone(),
            target_score,
            blind,
            state: GameState::Betting,
            players: vec![creator],
            scores,
            turn: 0,
            round: 0,
            pending_prediction: None,
            created_at: Utc::now(),
        }
    }

    pub fn id(&self) -> GameId {
        self.id
    }

    pub fn state(&self) -> GameState {
        self.state
    }

    pub fn blind(&self) -> u64 {
        self.blind
    }

    pub fn round(&self) -> u64 {
        self.round
    }

    pub fn player_count(&self) -> usize {
        self.players.len()
    }

    /// The player whose move is current.
    pub fn turn_holder(&self) -> &AccountId {
        &self.players[self.turn]
    }

    /// Add a player during the betting phase.
    pub fn join(&mut self, player: &str, contribution: u64) -> EngineResult<()> {
        if self.state != GameState::Betting {
            return Err(EngineError::InvalidState(self.state));
        }
        if self.players.iter().any(|p| p == player) {
            return Err(EngineError::AlreadyJoined);
        }
        if contribution < self.blind {
            return Err(EngineError::ContributionBelowBlind {
                contribution,
                blind: self.blind,
            });
        }
        self.players.push(player.to_string());
        self.scores.insert(player.to_string(), 0);
        Ok(())
    }

    /// Validate a prediction attempt and suspend the game on the oracle.
    ///
    /// Returns the round the attempt plays, for the pending-request record
    /// and the `Prediction` event. All validation happens here, before any
    /// oracle round-trip is spent on the request.
    pub fn begin_attempt(&mut self, caller: &str, prediction: u8) -> EngineResult<u64> {
        match self.state {
            GameState::Betting | GameState::Playing => {}
            other => return Err(EngineError::InvalidState(other)),
        }
        if self.players.len() < 2 {
            return Err(EngineError::NotEnoughPlayers);
        }
        if !(1..=DIE_FACES).contains(&prediction) {
            return Err(EngineError::PredictionOutOfRange(prediction));
        }
        if self.players[self.turn] != caller {
            return Err(EngineError::NotYourTurn);
        }

        self.pending_prediction = Some(prediction);
        self.state = GameState::Waiting;
        Ok(self.round)
    }

    /// Undo [`Self::begin_attempt`] after a failed oracle submission, so the
    /// game is not stranded waiting on a request the oracle never saw.
    pub fn abort_attempt(&mut self) {
        debug_assert_eq!(self.state, GameState::Waiting);
        self.pending_prediction = None;
        self.state = if self.round == 0 {
            GameState::Betting
        } else {
            GameState::Playing
        };
    }

    /// Resolve the outstanding attempt against a rolled die face.
    ///
    /// A correct prediction adds the rolled face to the predictor's score
    /// and keeps the turn; reaching the target score ends the game. A wrong
    /// prediction passes the turn. Either way the round counter advances.
    ///
    /// Only callable while `Waiting`; the engine guards this.
    pub fn resolve(&mut self, die: u8) -> RollOutcome {
        debug_assert_eq!(self.state, GameState::Waiting);
        let player = self.players[self.turn].clone();
        let prediction = self.pending_prediction.take();
        self.round += 1;

        if prediction == Some(die) {
            let score = self.scores.entry(player.clone()).or_insert(0);
            *score += u32::from(die);
            let score = *score;
            if score >= self.target_score {
                self.state = GameState::Ended;
                RollOutcome::Won {
                    winner: player,
                    score,
                }
            } else {
                self.state = GameState::Playing;
                RollOutcome::Scored { player, score }
            }
        } else {
            self.turn = (self.turn + 1) % self.players.len();
            self.state = GameState::Playing;
            RollOutcome::TurnPassed {
                next: self.players[self.turn].clone(),
            }
        }
    }

    /// Public read projection; the pool amount is supplied by the ledger.
    pub fn snapshot(&self, pool: u64) -> GameSnapshot {
        GameSnapshot {
            id: self.id,
            creator: self.creator.clone(),
            target_score: self.target_score,
            blind: self.blind,
            state: self.state,
            players: self.players.clone(),
            scores: self.scores.clone(),
            turn: self.turn,
            round: self.round,
            pool,
            created_at: self.created_at,
        }
    }
}

/// Read-only projection of a game's public fields.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameSnapshot {
    pub id: GameId,
    pub creator: AccountId,
    pub target_score: u32,
    pub blind: u64,
    pub state: GameState,
    pub players: Vec<AccountId>,
    pub scores: HashMap<AccountId, u32>,
    pub turn: usize,
    pub round: u64,
    pub pool: u64,
    pub created_at: DateTime<Utc>,
}
