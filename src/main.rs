//! Brick Breaker headless entry point
//!
//! Runs the autopilot against the real tick loop for a while, restarting
//! after every victory or game over, then prints the final snapshot as JSON.
//!
//! Usage: `brick-breaker [settings.json] [seconds] [easy|medium|hard]`

use std::path::PathBuf;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use brick_breaker::Settings;
use brick_breaker::audio::LogAudio;
use brick_breaker::consts::TICK_PERIOD;
use brick_breaker::platform::{Game, GameLoop, SystemClock};
use brick_breaker::sim::{Difficulty, GamePhase};

const DEFAULT_SETTINGS_PATH: &str = "settings.json";
const DEFAULT_RUN_SECONDS: u64 = 10;
const POLL_INTERVAL: Duration = Duration::from_millis(250);

fn main() {
    env_logger::init();
    log::info!("Brick Breaker (headless) starting...");

    let mut args = std::env::args().skip(1);
    let settings_path = args
        .next()
        .or_else(|| std::env::var("BRICK_BREAKER_SETTINGS").ok())
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_SETTINGS_PATH));
    let run_for = args
        .next()
        .and_then(|s| s.parse::<u64>().ok())
        .map(Duration::from_secs)
        .unwrap_or(Duration::from_secs(DEFAULT_RUN_SECONDS));

    let difficulty_arg = args.next();

    let settings = Settings::load_or_default(&settings_path);
    let difficulty = match difficulty_arg.as_deref() {
        Some(name) => name.parse::<Difficulty>().unwrap_or_else(|e| {
            log::warn!("{e}, using {}", settings.difficulty.as_str());
            settings.difficulty
        }),
        None => settings.difficulty,
    };

    let mut game = Game::new(&settings, Box::new(LogAudio), Arc::new(SystemClock::new()));
    game.set_autopilot(true);
    game.start_game(difficulty);

    let mut game_loop = GameLoop::spawn(game, TICK_PERIOD);
    let started = Instant::now();
    let mut sessions = 1u32;

    while started.elapsed() < run_for {
        thread::sleep(POLL_INTERVAL);
        game_loop.with_game(|game| match game.state.phase {
            GamePhase::Victory | GamePhase::GameOver => {
                log::info!(
                    "Session {} ended ({:?}) with score {}",
                    sessions,
                    game.state.phase,
                    game.state.score
                );
                sessions += 1;
                game.start_game(difficulty);
            }
            GamePhase::Menu | GamePhase::Playing => {}
        });
    }

    game_loop.stop();

    let snapshot = game_loop.snapshot();
    match serde_json::to_string_pretty(&snapshot) {
        Ok(json) => println!("{json}"),
        Err(e) => log::error!("Could not serialize snapshot: {e}"),
    }
    log::info!("Played {} session(s) in {:?}", sessions, run_for);
}
