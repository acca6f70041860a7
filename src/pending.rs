//! Pending randomness requests, keyed by request id.
//!
//! One entry exists per outstanding oracle request. The entry records which
//! game and round the request belongs to; a fulfillment whose recorded round
//! no longer matches the game's live round is stale and must be discarded.
//! The `Waiting` state guard keeps this at most one entry per game.

use crate::game::GameId;
use crate::oracle::RequestId;
use dashmap::DashMap;

/// What an outstanding request was issued for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingRoll {
    pub game_id: GameId,
    pub round: u64,
}

/// Thread-safe table of in-flight randomness requests.
#[derive(Default)]
pub struct PendingRollPool {
    pending: DashMap<RequestId, PendingRoll>,
}

impl PendingRollPool {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&self, request_id: RequestId, roll: PendingRoll) {
        let previous = self.pending.insert(request_id, roll);
        debug_assert!(previous.is_none(), "request id registered twice");
    }

    /// Consume the entry for a request. Duplicate fulfillments find nothing
    /// here and become no-ops.
    pub fn take(&self, request_id: &RequestId) -> Option<PendingRoll> {
        self.pending.remove(request_id).map(|(_, roll)| roll)
    }

    pub fn is_pending(&self, request_id: &RequestId) -> bool {
        self.pending.contains_key(request_id)
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[test]
    fn take_consumes_the_entry() {
        let pool = PendingRollPool::new();
        let id = Uuid::new_v4();
        pool.register(id, PendingRoll { game_id: 3, round: 1 });
        assert!(pool.is_pending(&id));

        let roll = pool.take(&id).unwrap();
        assert_eq!(roll, PendingRoll { game_id: 3, round: 1 });

        // Second take is the duplicate-fulfillment path.
        assert!(pool.take(&id).is_none());
        assert!(pool.is_empty());
    }

    #[test]
    fn unknown_ids_are_not_pending() {
        let pool = PendingRollPool::new();
        assert!(!pool.is_pending(&Uuid::new_v4()));
        assert_eq!(pool.len(), 0);
    }
}
