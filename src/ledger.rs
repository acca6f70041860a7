//! Escrow accounting: per-game pools and per-account credits.
//!
//! Contributions arrive attached to `create_game`/`bet` calls and are held
//! in the pool of the game they were made for; pools never commingle. A pool
//! is drained exactly once, when the game ends, by crediting its full amount
//! to the winner's ledger balance.

use crate::game::{AccountId, GameId};
use dashmap::DashMap;

pub struct Ledger {
    pools: DashMap<GameId, u64>,
    balances: DashMap<AccountId, u64>,
}

impl Ledger {
    pub fn new() -> Self {
        Self {
            pools: DashMap::new(),
            balances: DashMap::new(),
        }
    }

    /// Open the escrow pool for a freshly created game.
    pub fn open_pool(&self, game_id: GameId, contribution: u64) {
        let previous = self.pools.insert(game_id, contribution);
        debug_assert!(previous.is_none(), "pool opened twice for game {game_id}");
    }

    /// Add an accepted contribution to a game's pool.
    pub fn add_to_pool(&self, game_id: GameId, contribution: u64) {
        *self.pools.entry(game_id).or_insert(0) += contribution;
    }

    /// Current escrowed amount for a game. Zero once paid out.
    pub fn pool(&self, game_id: GameId) -> u64 {
        self.pools.get(&game_id).map(|p| *p).unwrap_or(0)
    }

    /// Drain a game's pool into the winner's balance and return the amount
    /// moved. The pool entry is removed, so a second call for the same game
    /// finds nothing to move.
    pub fn payout(&self, game_id: GameId, winner: &AccountId) -> u64 {
        let Some((_, amount)) = self.pools.remove(&game_id) else {
            debug_assert!(false, "payout for game {game_id} without a pool");
            return 0;
        };
        *self.balances.entry(winner.clone()).or_insert(0) += amount;
        tracing::info!(game_id, %winner, amount, "pool paid out");
        amount
    }

    /// Withdrawable credit held by an account.
    pub fn balance_of(&self, account: &str) -> u64 {
        self.balances.get(account).map(|b| *b).unwrap_or(0)
    }

    /// Sum of all open pools, for diagnostics and invariant checks.
    pub fn total_escrowed(&self) -> u64 {
        self.pools.iter().map(|p| *p.value()).sum()
    }
}

impl Default for Ledger {
    fn default() -> Self {
        Self::new()
    }
}
