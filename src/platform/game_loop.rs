//! Ticking thread
//!
//! `Game` bundles the simulation with its audio and clock. `GameLoop` owns
//! it behind a mutex and ticks it on a background thread; hosts read
//! snapshots and issue commands through the same lock. Paddle input arrives
//! through an `InputLatch`, which the loop reads exactly once at the start
//! of each tick.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread::{self, JoinHandle};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use super::clock::Clock;
use super::schedule::TickSchedule;
use crate::audio::{AudioManager, AudioPort};
use crate::layout::Layout;
use crate::settings::Settings;
use crate::sim::{
    Difficulty, GameEvent, GamePhase, GameState, PaddleCommand, Snapshot, TickInput, tick,
};

/// Seed from the wall clock when none is configured
fn fresh_seed() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos() as u64)
        .unwrap_or(0)
}

/// Paddle input gathered between ticks
#[derive(Debug, Default)]
pub struct InputLatch {
    inner: Mutex<TickInput>,
}

impl InputLatch {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, TickInput> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Latest absolute position wins; relative nudges add up
    pub fn set_paddle(&self, command: PaddleCommand) {
        let mut input = self.lock();
        input.paddle = Some(match (input.paddle, command) {
            (Some(PaddleCommand::MoveBy(a)), PaddleCommand::MoveBy(b)) => {
                PaddleCommand::MoveBy(a + b)
            }
            (_, command) => command,
        });
    }

    /// Release a ball held on the paddle
    pub fn request_launch(&self) {
        self.lock().launch = true;
    }

    /// Take everything latched since the last call
    pub fn take(&self) -> TickInput {
        std::mem::take(&mut *self.lock())
    }
}

/// Game instance holding all state
pub struct Game {
    pub state: GameState,
    audio: AudioManager,
    clock: Arc<dyn Clock>,
    autopilot: bool,
    // Track phase for logging transitions
    last_phase: GamePhase,
}

impl Game {
    pub fn new(settings: &Settings, port: Box<dyn AudioPort>, clock: Arc<dyn Clock>) -> Self {
        let seed = settings.seed.unwrap_or_else(fresh_seed);
        log::info!("Game initialized with seed: {}", seed);
        let state = GameState::new(seed, settings.resolve_layout());
        Self {
            last_phase: state.phase,
            state,
            audio: AudioManager::from_settings(port, settings),
            clock,
            autopilot: settings.autopilot,
        }
    }

    pub fn clock(&self) -> Arc<dyn Clock> {
        Arc::clone(&self.clock)
    }

    pub fn set_autopilot(&mut self, on: bool) {
        self.autopilot = on;
    }

    pub fn start_game(&mut self, difficulty: Difficulty) {
        self.state.start_game(difficulty);
        self.forward_events();
    }

    pub fn return_to_menu(&mut self) {
        let was_playing = self.state.phase == GamePhase::Playing;
        self.state.return_to_menu();
        if was_playing {
            self.audio.stop_music();
        }
        self.track_phase();
    }

    /// Screen resized; takes effect now or at the next start
    pub fn resize(&mut self, width: f32, height: f32) {
        self.state.set_layout(Layout::calculate(width, height));
    }

    /// Run one tick against the current clock
    pub fn step(&mut self, mut input: TickInput) -> Vec<GameEvent> {
        input.autopilot |= self.autopilot;
        let now = self.clock.now();
        tick(&mut self.state, &input, now);
        self.forward_events()
    }

    pub fn snapshot(&self) -> Snapshot {
        Snapshot::capture(&self.state, self.clock.now())
    }

    fn forward_events(&mut self) -> Vec<GameEvent> {
        let events = self.state.drain_events();
        self.audio.handle_events(&events);
        self.track_phase();
        events
    }

    fn track_phase(&mut self) {
        if self.state.phase != self.last_phase {
            log::info!("Phase {:?} -> {:?}", self.last_phase, self.state.phase);
            self.last_phase = self.state.phase;
        }
    }
}

fn lock(game: &Mutex<Game>) -> MutexGuard<'_, Game> {
    game.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Background thread ticking a `Game` at a fixed period
pub struct GameLoop {
    game: Arc<Mutex<Game>>,
    input: Arc<InputLatch>,
    running: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
}

impl GameLoop {
    pub fn spawn(game: Game, period: Duration) -> Self {
        let clock = game.clock();
        let game = Arc::new(Mutex::new(game));
        let input = Arc::new(InputLatch::new());
        let running = Arc::new(AtomicBool::new(true));

        let handle = {
            let game = Arc::clone(&game);
            let input = Arc::clone(&input);
            let running = Arc::clone(&running);
            thread::spawn(move || run(&game, &input, &running, clock.as_ref(), period))
        };
        log::info!("Game loop started ({:?} period)", period);

        Self {
            game,
            input,
            running,
            handle: Some(handle),
        }
    }

    /// Input side, safe to share with event handlers
    pub fn input(&self) -> Arc<InputLatch> {
        Arc::clone(&self.input)
    }

    /// Run `f` with the game locked (between ticks)
    pub fn with_game<R>(&self, f: impl FnOnce(&mut Game) -> R) -> R {
        f(&mut lock(&self.game))
    }

    pub fn snapshot(&self) -> Snapshot {
        lock(&self.game).snapshot()
    }

    pub fn is_running(&self) -> bool {
        self.handle.is_some()
    }

    /// Stop ticking and wait for the thread to finish
    pub fn stop(&mut self) {
        self.running.store(false, Ordering::Release);
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                log::error!("Game loop thread panicked");
            }
        }
    }
}

impl Drop for GameLoop {
    fn drop(&mut self) {
        self.stop();
    }
}

fn run(
    game: &Mutex<Game>,
    input: &InputLatch,
    running: &AtomicBool,
    clock: &dyn Clock,
    period: Duration,
) {
    let mut schedule = TickSchedule::new(period, clock.now());

    while running.load(Ordering::Acquire) {
        let now = clock.now();
        if !schedule.is_due(now) {
            thread::sleep(schedule.wait_time(now).min(period));
            continue;
        }

        let tick_input = input.take();
        lock(game).step(tick_input);
        schedule.complete(clock.now());
    }

    log::info!("Game loop stopped ({} overruns)", schedule.overruns());
}
