//! End-to-end lifecycle tests: create, bet, predict, oracle fulfillment,
//! payout, and every rejection path a caller can hit.

use dicepool::{
    DiceEngine, EngineConfig, EngineError, FulfillOutcome, GameEvent, GameState, RecordingOracle,
    SilentOracle,
};
use std::sync::Arc;

const ADMIN: &str = "admin";

fn engine_with_recording() -> (DiceEngine, Arc<RecordingOracle>) {
    let oracle = Arc::new(RecordingOracle::new());
    let engine = DiceEngine::new(EngineConfig::default(), ADMIN, oracle.clone());
    (engine, oracle)
}

/// Fulfill the latest outstanding request so the die shows `face`.
fn fulfill_with_face(engine: &DiceEngine, oracle: &RecordingOracle, face: u8) {
    let request = oracle.last_request().expect("a request is outstanding");
    let outcome = engine.fulfill_randomness(request.id, u64::from(face - 1));
    assert!(matches!(outcome, FulfillOutcome::Applied { .. }));
}

#[tokio::test]
async fn creating_a_game_increments_the_counter() {
    let (engine, _) = engine_with_recording();
    let game_id = engine.create_game("alice", 20, 5000, 5000).unwrap();
    assert_eq!(game_id, 0);
    assert_eq!(engine.game_counter(ADMIN).unwrap(), 1);

    let snapshot = engine.game(game_id).unwrap();
    assert_eq!(snapshot.creator, "alice");
    assert_eq!(snapshot.state, GameState::Betting);
    assert_eq!(snapshot.players, vec!["alice".to_string()]);
    assert_eq!(snapshot.pool, 5000);
}

#[tokio::test]
async fn game_counter_is_admin_only() {
    let (engine, _) = engine_with_recording();
    assert!(matches!(
        engine.game_counter("alice"),
        Err(EngineError::Unauthorized)
    ));
}

#[tokio::test]
async fn create_game_validation_leaves_the_counter_unchanged() {
    let (engine, _) = engine_with_recording();

    assert!(matches!(
        engine.create_game("alice", 20, 0, 0),
        Err(EngineError::BlindZero)
    ));
    assert!(matches!(
        engine.create_game("alice", 20, 1000, 999),
        Err(EngineError::ContributionBelowBlind { .. })
    ));
    assert!(matches!(
        engine.create_game("alice", 21, 1000, 1000),
        Err(EngineError::TargetScoreTooHigh {
            requested: 21,
            ceiling: 20,
        })
    ));
    assert!(matches!(
        engine.create_game("alice", 0, 1000, 1000),
        Err(EngineError::TargetScoreZero)
    ));

    assert_eq!(engine.game_counter(ADMIN).unwrap(), 0);
    assert_eq!(engine.total_escrowed(), 0);
}

#[tokio::test]
async fn max_target_score_is_admin_gated_and_observable() {
    let (engine, _) = engine_with_recording();
    let mut events = engine.subscribe();

    assert!(matches!(
        engine.set_max_target_score("mallory", 50),
        Err(EngineError::Unauthorized)
    ));
    assert_eq!(engine.max_target_score(), 20);

    engine.set_max_target_score(ADMIN, 50).unwrap();
    assert_eq!(engine.max_target_score(), 50);
    assert_eq!(
        events.recv().await.unwrap(),
        GameEvent::MaxTargetScoreChanged { old: 20, new: 50 }
    );

    // The new ceiling is live for game creation.
    engine.create_game("alice", 50, 1000, 1000).unwrap();
    assert!(matches!(
        engine.create_game("alice", 51, 1000, 1000),
        Err(EngineError::TargetScoreTooHigh { .. })
    ));
}

#[tokio::test]
async fn bet_rejections() {
    let (engine, _) = engine_with_recording();
    let game_id = engine.create_game("alice", 20, 1000, 1000).unwrap();

    assert!(matches!(
        engine.bet("bob", game_id + 1, 1000),
        Err(EngineError::GameNotFound(_))
    ));
    assert!(matches!(
        engine.bet("bob", game_id, 999),
        Err(EngineError::ContributionBelowBlind { .. })
    ));

    engine.bet("bob", game_id, 1000).unwrap();
    assert!(matches!(
        engine.bet("bob", game_id, 1000),
        Err(EngineError::AlreadyJoined)
    ));

    let snapshot = engine.game(game_id).unwrap();
    assert_eq!(snapshot.players.len(), 2);
    assert_eq!(snapshot.pool, 2000);
}

#[tokio::test]
async fn bet_emits_an_event() {
    let (engine, _) = engine_with_recording();
    let game_id = engine.create_game("alice", 20, 1000, 1000).unwrap();
    let mut events = engine.subscribe();

    engine.bet("bob", game_id, 1500).unwrap();
    assert_eq!(
        events.recv().await.unwrap(),
        GameEvent::Bet {
            game_id,
            player: "bob".to_string(),
            amount: 1500,
        }
    );
}

#[tokio::test]
async fn lone_player_cannot_roll() {
    let (engine, oracle) = engine_with_recording();
    let game_id = engine.create_game("alice", 20, 1000, 1000).unwrap();

    assert!(matches!(
        engine.predict_and_roll("alice", game_id, 5).await,
        Err(EngineError::NotEnoughPlayers)
    ));
    assert_eq!(oracle.request_count(), 0);
    assert_eq!(engine.game(game_id).unwrap().state, GameState::Betting);
}

#[tokio::test]
async fn invalid_predictions_never_reach_the_oracle() {
    let (engine, oracle) = engine_with_recording();
    let game_id = engine.create_game("alice", 20, 1000, 1000).unwrap();
    engine.bet("bob", game_id, 1000).unwrap();

    for bad in [0u8, 7] {
        assert!(matches!(
            engine.predict_and_roll("alice", game_id, bad).await,
            Err(EngineError::PredictionOutOfRange(_))
        ));
    }
    assert!(matches!(
        engine.predict_and_roll("bob", game_id, 5).await,
        Err(EngineError::NotYourTurn)
    ));
    assert_eq!(oracle.request_count(), 0);
}

#[tokio::test]
async fn first_roll_emits_prediction_then_roll_for_round_zero() {
    let (engine, oracle) = engine_with_recording();
    let game_id = engine.create_game("alice", 20, 1000, 1000).unwrap();
    engine.bet("bob", game_id, 1000).unwrap();
    let mut events = engine.subscribe();

    engine.predict_and_roll("alice", game_id, 5).await.unwrap();
    assert_eq!(
        events.recv().await.unwrap(),
        GameEvent::Prediction {
            game_id,
            round: 0,
            player: "alice".to_string(),
            prediction: 5,
        }
    );

    fulfill_with_face(&engine, &oracle, 5);
    assert_eq!(
        events.recv().await.unwrap(),
        GameEvent::Roll {
            game_id,
            round: 0,
            rolled: 5,
        }
    );
}

#[tokio::test]
async fn correct_prediction_scores_and_keeps_the_turn() {
    let (engine, oracle) = engine_with_recording();
    let game_id = engine.create_game("alice", 20, 1000, 1000).unwrap();
    engine.bet("bob", game_id, 1000).unwrap();

    engine.predict_and_roll("alice", game_id, 4).await.unwrap();
    fulfill_with_face(&engine, &oracle, 4);

    let snapshot = engine.game(game_id).unwrap();
    assert_eq!(snapshot.state, GameState::Playing);
    assert_eq!(snapshot.scores["alice"], 4);
    assert_eq!(snapshot.turn, 0, "turn stays with the correct predictor");
    assert_eq!(snapshot.round, 1);
}

#[tokio::test]
async fn wrong_prediction_passes_the_turn() {
    let (engine, oracle) = engine_with_recording();
    let game_id = engine.create_game("alice", 20, 1000, 1000).unwrap();
    engine.bet("bob", game_id, 1000).unwrap();

    engine.predict_and_roll("alice", game_id, 2).await.unwrap();
    fulfill_with_face(&engine, &oracle, 6);

    let snapshot = engine.game(game_id).unwrap();
    assert_eq!(snapshot.turn, 1);
    assert_eq!(snapshot.scores["alice"], 0);

    // The previous holder is locked out until the turn comes back around.
    assert!(matches!(
        engine.predict_and_roll("alice", game_id, 3).await,
        Err(EngineError::NotYourTurn)
    ));

    engine.predict_and_roll("bob", game_id, 5).await.unwrap();
    fulfill_with_face(&engine, &oracle, 1);
    assert_eq!(engine.game(game_id).unwrap().turn, 0);
}

#[tokio::test]
async fn winner_takes_the_pool() {
    let (engine, oracle) = engine_with_recording();
    let game_id = engine.create_game("alice", 5, 1000, 1000).unwrap();
    engine.bet("bob", game_id, 1000).unwrap();
    let mut events = engine.subscribe();

    // Three correct predictions: 1 + 2 + 3 = 6 crosses the target of 5.
    for face in [1u8, 2, 3] {
        engine.predict_and_roll("alice", game_id, face).await.unwrap();
        fulfill_with_face(&engine, &oracle, face);
    }

    let snapshot = engine.game(game_id).unwrap();
    assert_eq!(snapshot.state, GameState::Ended);
    assert_eq!(snapshot.scores["alice"], 6);
    assert_eq!(snapshot.pool, 0);
    assert_eq!(engine.balance_of("alice"), 2000);
    assert_eq!(engine.balance_of("bob"), 0);
    assert_eq!(engine.total_escrowed(), 0);

    let ended = std::iter::from_fn(|| events.try_recv().ok())
        .find(|e| matches!(e, GameEvent::GameEnded { .. }))
        .expect("a GameEnded event was emitted");
    assert_eq!(
        ended,
        GameEvent::GameEnded {
            game_id,
            winner: "alice".to_string(),
            payout: 2000,
        }
    );

    // Terminal state: no further play or joining.
    assert!(matches!(
        engine.predict_and_roll("alice", game_id, 1).await,
        Err(EngineError::InvalidState(GameState::Ended))
    ));
    assert!(matches!(
        engine.bet("carol", game_id, 1000),
        Err(EngineError::InvalidState(GameState::Ended))
    ));
}

#[tokio::test]
async fn betting_closes_when_play_begins() {
    let (engine, oracle) = engine_with_recording();
    let game_id = engine.create_game("alice", 20, 1000, 1000).unwrap();
    engine.bet("bob", game_id, 1000).unwrap();

    engine.predict_and_roll("alice", game_id, 3).await.unwrap();
    assert!(matches!(
        engine.bet("carol", game_id, 1000),
        Err(EngineError::InvalidState(GameState::Waiting))
    ));

    fulfill_with_face(&engine, &oracle, 1);
    assert!(matches!(
        engine.bet("carol", game_id, 1000),
        Err(EngineError::InvalidState(GameState::Playing))
    ));
}

#[tokio::test]
async fn pool_equals_contributions_until_the_single_payout() {
    let (engine, oracle) = engine_with_recording();
    let game_id = engine.create_game("alice", 3, 1000, 1500).unwrap();
    engine.bet("bob", game_id, 1000).unwrap();
    engine.bet("carol", game_id, 2500).unwrap();
    assert_eq!(engine.game(game_id).unwrap().pool, 5000);

    // A resolved miss moves no money.
    engine.predict_and_roll("alice", game_id, 2).await.unwrap();
    fulfill_with_face(&engine, &oracle, 6);
    assert_eq!(engine.game(game_id).unwrap().pool, 5000);
    assert_eq!(engine.total_escrowed(), 5000);

    // Bob wins with a single 3.
    engine.predict_and_roll("bob", game_id, 3).await.unwrap();
    fulfill_with_face(&engine, &oracle, 3);

    assert_eq!(engine.game(game_id).unwrap().state, GameState::Ended);
    assert_eq!(engine.game(game_id).unwrap().pool, 0);
    assert_eq!(engine.balance_of("bob"), 5000);
    assert_eq!(engine.total_escrowed(), 0);
}

#[tokio::test]
async fn unfulfillable_oracle_stalls_only_its_game() {
    let engine = DiceEngine::new(EngineConfig::default(), ADMIN, Arc::new(SilentOracle));
    let stuck = engine.create_game("alice", 20, 1000, 1000).unwrap();
    engine.bet("bob", stuck, 1000).unwrap();

    engine.predict_and_roll("alice", stuck, 5).await.unwrap();
    assert_eq!(engine.game(stuck).unwrap().state, GameState::Waiting);

    // Fail closed: the game cannot be poked into reissuing a request.
    assert!(matches!(
        engine.predict_and_roll("alice", stuck, 6).await,
        Err(EngineError::InvalidState(GameState::Waiting))
    ));
    assert_eq!(engine.game(stuck).unwrap().state, GameState::Waiting);
    assert_eq!(engine.game(stuck).unwrap().pool, 2000);

    // Other games on the same engine keep working.
    let fresh = engine.create_game("carol", 20, 1000, 1000).unwrap();
    engine.bet("dave", fresh, 1000).unwrap();
    engine.predict_and_roll("carol", fresh, 1).await.unwrap();
    assert_eq!(engine.game(fresh).unwrap().state, GameState::Waiting);
}

#[tokio::test]
async fn predicting_on_a_missing_game_fails() {
    let (engine, _) = engine_with_recording();
    assert!(matches!(
        engine.predict_and_roll("alice", 7, 3).await,
        Err(EngineError::GameNotFound(7))
    ));
}
