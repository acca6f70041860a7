//! Dicepool simulation driver.
//!
//! Spins up an engine with a channel-backed oracle, plays a batch of games
//! with randomly predicting players, and prints a settlement summary. Useful
//! for eyeballing the full request/fulfill round-trip under load.

use clap::Parser;
use dicepool::{ChannelOracle, DiceEngine, EngineConfig, GameState};
use rand::{rngs::StdRng, Rng, SeedableRng};
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

const ADMIN: &str = "admin";

#[derive(Debug, Parser)]
#[command(name = "dicepool", about = "Turn-based dice-betting engine simulator")]
struct Args {
    /// Path to a TOML engine config file.
    #[arg(long)]
    config: Option<std::path::PathBuf>,

    /// Number of games to play.
    #[arg(long, default_value_t = 5)]
    games: u64,

    /// Players joining each game.
    #[arg(long, default_value_t = 3)]
    players: usize,

    /// Target score for each game.
    #[arg(long, default_value_t = 10)]
    target: u32,

    /// Blind every player escrows to join.
    #[arg(long, default_value_t = 1000)]
    blind: u64,

    /// RNG seed for reproducible runs.
    #[arg(long)]
    seed: Option<u64>,

    /// Print each finished game's snapshot as JSON.
    #[arg(long)]
    json: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let args = Args::parse();
    if args.players < 2 {
        return Err("at least two players are required per game".into());
    }

    let config = match &args.config {
        Some(path) => EngineConfig::load_from_file(path)?,
        None => EngineConfig::default(),
    };

    let (oracle, mut requests) = ChannelOracle::new();
    let engine = Arc::new(DiceEngine::new(config, ADMIN, Arc::new(oracle)));

    let seed = args.seed.unwrap_or_else(rand::random);
    tracing::info!(seed, "starting simulation");

    // Oracle stand-in: fulfill every request with a fresh random value.
    let fulfiller = {
        let engine = Arc::clone(&engine);
        let mut rng = StdRng::seed_from_u64(seed);
        tokio::spawn(async move {
            while let Some(request) = requests.recv().await {
                engine.fulfill_randomness(request.id, rng.gen::<u64>());
            }
        })
    };

    let mut rng = StdRng::seed_from_u64(seed.wrapping_add(1));
    let players: Vec<String> = (0..args.players).map(|i| format!("player-{i}")).collect();
    let mut rolls_total = 0u64;

    for _ in 0..args.games {
        let game_id = engine.create_game(&players[0], args.target, args.blind, args.blind)?;
        for player in &players[1..] {
            engine.bet(player, game_id, args.blind)?;
        }

        loop {
            let snapshot = engine.game(game_id).expect("game exists");
            match snapshot.state {
                GameState::Ended => break,
                GameState::Waiting => {
                    tokio::time::sleep(Duration::from_millis(1)).await;
                    continue;
                }
                GameState::Betting | GameState::Playing => {}
            }

            let holder = snapshot.players[snapshot.turn].clone();
            let prediction: u8 = rng.gen_range(1..=6);
            engine.predict_and_roll(&holder, game_id, prediction).await?;
            rolls_total += 1;
        }

        let snapshot = engine.game(game_id).expect("game exists");
        tracing::info!(game_id, rounds = snapshot.round, "game finished");
        if args.json {
            println!("{}", serde_json::to_string_pretty(&snapshot)?);
        }
    }

    fulfiller.abort();

    println!("simulation summary");
    println!("==================");
    println!("games played:   {}", engine.game_counter(ADMIN)?);
    println!("rolls resolved: {rolls_total}");
    for player in &players {
        println!("{player}: balance {}", engine.balance_of(player));
    }
    println!("still escrowed: {}", engine.total_escrowed());

    Ok(())
}
