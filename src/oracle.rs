//! Randomness oracle boundary.
//!
//! The engine cannot produce unbiased randomness itself. Each roll becomes a
//! [`RollRequest`] submitted to a [`RandomnessOracle`]; the fulfillment
//! arrives later, out of band, through
//! [`crate::DiceEngine::fulfill_randomness`]. The oracle owes no delivery
//! guarantees: fulfillments may never arrive, arrive late, or arrive for a
//! round the game has moved past.

use crate::game::GameId;
use async_trait::async_trait;
use std::sync::Mutex;
use tokio::sync::mpsc;
use uuid::Uuid;

/// Opaque request identifier, allocated by the engine.
pub type RequestId = Uuid;

/// One outbound randomness request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RollRequest {
    pub id: RequestId,
    pub game_id: GameId,
    pub round: u64,
}

#[derive(Debug, thiserror::Error)]
pub enum OracleError {
    #[error("oracle unavailable: {0}")]
    Unavailable(String),
}

/// Outbound half of the request/fulfill protocol.
///
/// `submit` only hands the request over; it must return without waiting for
/// the outcome. A submission error aborts the triggering player call.
#[async_trait]
pub trait RandomnessOracle: Send + Sync {
    async fn submit(&self, request: RollRequest) -> Result<(), OracleError>;
}

/// Forwards requests to an mpsc channel, for wiring a fulfillment task (or
/// process) behind the engine.
pub struct ChannelOracle {
    sender: mpsc::UnboundedSender<RollRequest>,
}

impl ChannelOracle {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<RollRequest>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (Self { sender }, receiver)
    }
}

#[async_trait]
impl RandomnessOracle for ChannelOracle {
    async fn submit(&self, request: RollRequest) -> Result<(), OracleError> {
        self.sender
            .send(request)
            .map_err(|_| OracleError::Unavailable("request channel closed".to_string()))
    }
}

/// Captures requests so tests can fulfill them manually.
#[derive(Default)]
pub struct RecordingOracle {
    requests: Mutex<Vec<RollRequest>>,
}

impl RecordingOracle {
    pub fn new() -> Self {
        Self::default()
    }

    /// The most recently submitted request, if any.
    pub fn last_request(&self) -> Option<RollRequest> {
        self.requests.lock().unwrap().last().cloned()
    }

    pub fn requests(&self) -> Vec<RollRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn request_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

#[async_trait]
impl RandomnessOracle for RecordingOracle {
    async fn submit(&self, request: RollRequest) -> Result<(), OracleError> {
        self.requests.lock().unwrap().push(request);
        Ok(())
    }
}

/// Accepts every request and never fulfills any of them. Games that roll
/// against this oracle stay `Waiting` forever; the engine fails closed and
/// rejects further play on them.
pub struct SilentOracle;

#[async_trait]
impl RandomnessOracle for SilentOracle {
    async fn submit(&self, _request: RollRequest) -> Result<(), OracleError> {
        Ok(())
    }
}

/// Refuses every submission, for exercising the abort path.
pub struct UnavailableOracle;

#[async_trait]
impl RandomnessOracle for UnavailableOracle {
    async fn submit(&self, _request: RollRequest) -> Result<(), OracleError> {
        Err(OracleError::Unavailable("oracle offline".to_string()))
    }
}
