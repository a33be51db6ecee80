//! Game state and core simulation types
//!
//! `GameState` is the single authoritative record the tick mutates. The
//! presentation layer reads it through `Snapshot` and drains its events.

use std::str::FromStr;
use std::time::Duration;

use glam::Vec2;
use rand::SeedableRng;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::powerup::{Effects, Powerup, PowerupKind, revert};
use crate::consts::KEYPAD_STEP;
use crate::layout::Layout;

/// Current phase of the game
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum GamePhase {
    /// Waiting for a difficulty to be picked
    Menu,
    /// Active gameplay
    Playing,
    /// Every block destroyed
    Victory,
    /// Ball fell past the bottom with no shield
    GameOver,
}

/// Difficulty presets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Easy,
    #[default]
    Medium,
    Hard,
}

impl Difficulty {
    pub fn as_str(&self) -> &'static str {
        match self {
            Difficulty::Easy => "easy",
            Difficulty::Medium => "medium",
            Difficulty::Hard => "hard",
        }
    }

    /// Block rows in the grid
    pub fn rows(&self) -> usize {
        match self {
            Difficulty::Easy => 2,
            Difficulty::Medium => 4,
            Difficulty::Hard => 6,
        }
    }

    /// Initial ball speed per axis (pixels per tick)
    pub fn base_speed(&self) -> f32 {
        match self {
            Difficulty::Easy => 2.0,
            Difficulty::Medium => 3.0,
            Difficulty::Hard => 5.0,
        }
    }

    /// Powerups that may spawn in one session
    pub fn spawn_budget(&self) -> u32 {
        match self {
            Difficulty::Easy => 6,
            Difficulty::Medium => 3,
            Difficulty::Hard => 2,
        }
    }
}

impl FromStr for Difficulty {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "easy" => Ok(Difficulty::Easy),
            "medium" | "med" => Ok(Difficulty::Medium),
            "hard" => Ok(Difficulty::Hard),
            other => Err(format!("unknown difficulty '{other}'")),
        }
    }
}

/// Ball state - free-moving or riding the paddle
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum BallState {
    /// Ball is free-moving
    Free,
    /// Ball sits on the paddle at `offset` from the paddle's left edge
    Attached { offset: f32 },
}

/// The ball
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Ball {
    /// Top-left corner
    pub pos: Vec2,
    /// Pixels per tick
    pub vel: Vec2,
    pub size: f32,
    pub state: BallState,
}

impl Ball {
    pub fn new(pos: Vec2, vel: Vec2, size: f32) -> Self {
        Self {
            pos,
            vel,
            size,
            state: BallState::Free,
        }
    }

    /// Horizontal center
    #[inline]
    pub fn center_x(&self) -> f32 {
        self.pos.x + self.size / 2.0
    }

    /// Follow the paddle while attached
    pub fn update_attached(&mut self, paddle: &Paddle, paddle_top: f32) {
        if let BallState::Attached { offset } = self.state {
            self.pos = Vec2::new(paddle.x + offset, paddle_top - self.size);
        }
    }
}

/// The player's paddle
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Paddle {
    /// Left edge
    pub x: f32,
    pub width: f32,
    /// Width restored when `expand` ends
    pub base_width: f32,
    pub height: f32,
}

impl Paddle {
    /// A paddle centred in the arena
    pub fn centered(layout: &Layout) -> Self {
        Self {
            x: (layout.arena_width - layout.paddle_width) / 2.0,
            width: layout.paddle_width,
            base_width: layout.paddle_width,
            height: layout.paddle_height,
        }
    }
}

/// Paddle movement request from the input source
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PaddleCommand {
    /// Absolute left-edge position
    MoveTo(f32),
    /// Relative drag
    MoveBy(f32),
}

impl PaddleCommand {
    /// One keypad press to the left
    pub fn nudge_left() -> Self {
        PaddleCommand::MoveBy(-KEYPAD_STEP)
    }

    /// One keypad press to the right
    pub fn nudge_right() -> Self {
        PaddleCommand::MoveBy(KEYPAD_STEP)
    }
}

/// One grid cell
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Block {
    /// Top-left corner
    pub pos: Vec2,
    /// False once destroyed; never flips back within a session
    pub visible: bool,
    /// Cosmetic RGB
    pub color: u32,
}

/// Row colors, cycled for grids taller than the palette
const BLOCK_PALETTE: [u32; 6] = [0xff595e, 0xffca3a, 0x8ac926, 0x1982c4, 0x6a4c93, 0xf15bb5];

/// Short visual pulse at a paddle hit
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Pulse {
    pub pos: Vec2,
    pub expires_at: Duration,
}

/// Things the presentation layer may react to (sounds, particles)
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "camelCase")]
pub enum GameEvent {
    SessionStarted { difficulty: Difficulty },
    PaddleHit { pos: Vec2 },
    BlockDestroyed { index: usize },
    PowerupSpawned { kind: PowerupKind },
    PowerupCollected { kind: PowerupKind },
    ShieldSaved,
    Victory { score: u64 },
    GameOver { score: u64 },
}

/// Complete game state
#[derive(Debug, Clone)]
pub struct GameState {
    /// Seed the RNG was created from
    pub seed: u64,
    /// All gameplay randomness draws from here
    pub rng: Pcg32,
    /// Layout in force for the current session
    pub layout: Layout,
    /// Layout requested mid-session, applied on the next start
    pending_layout: Option<Layout>,
    pub difficulty: Difficulty,
    pub phase: GamePhase,
    /// Score of the current (or just finished) session
    pub score: u64,
    /// Final score of the last completed session
    pub last_score: Option<u64>,
    /// Simulation tick counter
    pub time_ticks: u64,
    pub ball: Ball,
    pub paddle: Paddle,
    /// Fixed grid, row-major
    pub blocks: Vec<Block>,
    /// Falling powerups (sorted by id)
    pub powerups: Vec<Powerup>,
    pub effects: Effects,
    /// Powerups that may still spawn this session
    pub spawn_budget: u32,
    /// Visual paddle-hit pulses (not gameplay-affecting)
    pub pulses: Vec<Pulse>,
    /// Pending notifications, drained by the presentation layer
    pub events: Vec<GameEvent>,
    /// Next entity ID
    next_id: u32,
}

impl GameState {
    /// Create a state sitting in the menu
    pub fn new(seed: u64, layout: Layout) -> Self {
        let layout = layout.sanitized();
        let difficulty = Difficulty::default();
        let mut state = Self {
            seed,
            rng: Pcg32::seed_from_u64(seed),
            layout,
            pending_layout: None,
            difficulty,
            phase: GamePhase::Menu,
            score: 0,
            last_score: None,
            time_ticks: 0,
            ball: Ball::new(Vec2::ZERO, Vec2::ZERO, layout.ball_size),
            paddle: Paddle::centered(&layout),
            blocks: Vec::new(),
            powerups: Vec::new(),
            effects: Effects::default(),
            spawn_budget: 0,
            pulses: Vec::new(),
            events: Vec::new(),
            next_id: 1,
        };
        state.reset_ball();
        state.blocks = state.create_blocks(difficulty);
        state
    }

    /// Allocate a new entity ID
    pub fn next_entity_id(&mut self) -> u32 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    /// Begin a session (from any phase)
    pub fn start_game(&mut self, difficulty: Difficulty) {
        if self.phase == GamePhase::Playing {
            self.clear_session_effects();
        }
        if let Some(layout) = self.pending_layout.take() {
            log::info!(
                "Applying layout {}x{}",
                layout.arena_width,
                layout.arena_height
            );
            self.layout = layout;
        }

        self.difficulty = difficulty;
        self.score = 0;
        self.blocks = self.create_blocks(difficulty);
        self.paddle = Paddle::centered(&self.layout);
        self.reset_ball();
        self.powerups.clear();
        self.effects = Effects::default();
        self.pulses.clear();
        self.spawn_budget = difficulty.spawn_budget();
        self.phase = GamePhase::Playing;

        log::info!(
            "Game started on {} ({} blocks, budget {})",
            difficulty.as_str(),
            self.blocks.len(),
            self.spawn_budget
        );
        self.events.push(GameEvent::SessionStarted { difficulty });
    }

    /// Go back to the menu. Abandoning a session does not record a score.
    pub fn return_to_menu(&mut self) {
        if self.phase == GamePhase::Playing {
            log::info!("Session abandoned with score {}", self.score);
            self.clear_session_effects();
            self.blocks = self.create_blocks(self.difficulty);
            self.reset_ball();
        }
        self.phase = GamePhase::Menu;
    }

    /// Swap the layout. Mid-session requests wait for the next start.
    pub fn set_layout(&mut self, layout: Layout) {
        let layout = layout.sanitized();
        if self.phase == GamePhase::Playing {
            log::debug!("Layout change deferred until next game");
            self.pending_layout = Some(layout);
            return;
        }

        self.pending_layout = None;
        self.layout = layout;
        self.paddle = Paddle::centered(&layout);
        self.blocks = self.create_blocks(self.difficulty);
        self.reset_ball();
    }

    /// Apply a paddle input, clamped to the arena
    pub fn move_paddle(&mut self, command: PaddleCommand) {
        self.paddle.x = match command {
            PaddleCommand::MoveTo(x) => x,
            PaddleCommand::MoveBy(dx) => self.paddle.x + dx,
        };
        self.clamp_paddle();
    }

    /// Keep the paddle inside `[0, arena_width - paddle_width]`
    pub fn clamp_paddle(&mut self) {
        let max_x = self.layout.max_paddle_x(self.paddle.width);
        self.paddle.x = if self.paddle.x.is_finite() {
            self.paddle.x.clamp(0.0, max_x)
        } else {
            max_x / 2.0
        };
    }

    pub fn visible_blocks(&self) -> usize {
        self.blocks.iter().filter(|b| b.visible).count()
    }

    /// Fresh, fully visible grid for a difficulty
    pub fn create_blocks(&self, difficulty: Difficulty) -> Vec<Block> {
        let rows = difficulty.rows();
        let columns = self.layout.block_columns;
        (0..rows * columns)
            .map(|i| {
                let (column, row) = (i % columns, i / columns);
                Block {
                    pos: self.layout.block_origin(column, row),
                    visible: true,
                    color: BLOCK_PALETTE[row % BLOCK_PALETTE.len()],
                }
            })
            .collect()
    }

    /// Ball at arena center with the difficulty's serve velocity
    pub fn reset_ball(&mut self) {
        let speed = self.difficulty.base_speed();
        self.ball = Ball::new(
            Vec2::new(self.layout.arena_width / 2.0, self.layout.arena_height / 2.0),
            Vec2::new(speed, -speed),
            self.layout.ball_size,
        );
    }

    /// Put the ball back above the paddle after a shield save.
    ///
    /// Any slows still in force are applied so their reverts restore the
    /// serve speed exactly.
    pub fn relaunch_ball(&mut self) {
        let speed = self.difficulty.base_speed();
        let slowed = self
            .effects
            .iter()
            .filter(|e| e.kind == PowerupKind::Slow)
            .fold(1.0_f32, |acc, _| acc * 0.6);
        let x = self.paddle.x + self.paddle.width / 2.0 - self.layout.ball_size / 2.0;
        let y = self.layout.paddle_top() - self.layout.ball_size;
        self.ball = Ball::new(
            Vec2::new(x, y),
            Vec2::new(speed, -speed) * slowed,
            self.layout.ball_size,
        );
    }

    /// Playing -> Victory
    pub fn enter_victory(&mut self) {
        log::info!("Victory with score {}", self.score);
        self.last_score = Some(self.score);
        self.clear_session_effects();
        self.phase = GamePhase::Victory;
        self.events.push(GameEvent::Victory { score: self.score });
    }

    /// Playing -> GameOver. The grid is rebuilt for a retry; the score stays
    /// on display until the next start.
    pub fn enter_game_over(&mut self) {
        log::info!("Game over with score {}", self.score);
        self.last_score = Some(self.score);
        self.clear_session_effects();
        self.blocks = self.create_blocks(self.difficulty);
        self.relaunch_ball();
        self.phase = GamePhase::GameOver;
        self.events.push(GameEvent::GameOver { score: self.score });
    }

    /// Drop every powerup, effect and pulse, undoing effects that changed
    /// the paddle. The ball is about to be replaced so its velocity is left
    /// alone.
    fn clear_session_effects(&mut self) {
        for effect in self.effects.take_all() {
            if effect.kind == PowerupKind::Expand {
                revert(self, &effect);
            }
        }
        self.ball.state = BallState::Free;
        self.powerups.clear();
        self.pulses.clear();
    }

    /// Take all pending notifications
    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }

    /// Keep powerups sorted by ID for deterministic iteration
    pub fn normalize_order(&mut self) {
        self.powerups.sort_by_key(|p| p.id);
    }
}
