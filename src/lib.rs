//! Brick Breaker - a breakout simulation core
//!
//! Core modules:
//! - `sim`: Deterministic simulation (physics, collisions, powerups, game state)
//! - `layout`: Numeric arena/entity sizes derived from the screen
//! - `platform`: Clock, fixed-period scheduling and the threaded game loop
//! - `audio`: Audio port the presentation layer plugs into
//! - `settings`: Player preferences loaded from JSON

pub mod audio;
pub mod layout;
pub mod platform;
pub mod settings;
pub mod sim;

pub use layout::Layout;
pub use settings::{ConfigError, Settings};

/// Game configuration constants
pub mod consts {
    use std::time::Duration;

    /// Fixed simulation period (~60 Hz)
    pub const TICK_PERIOD: Duration = Duration::from_millis(16);

    /// Number of block columns in the grid
    pub const BLOCK_COLUMNS: usize = 6;
    /// Distance from the arena top to the first block row
    pub const BLOCK_GRID_TOP: f32 = 40.0;

    /// Ball bottom may sit this far below the paddle top and still count as a hit
    pub const PADDLE_HIT_BAND: f32 = 10.0;
    /// Launch angle at the paddle edges, measured from vertical (degrees)
    pub const PADDLE_MAX_ANGLE_DEG: f32 = 60.0;
    /// Speed boost when ball hits paddle (multiplicative, compounding)
    pub const PADDLE_BOOST: f32 = 1.05;
    /// Paddle movement per keypad press
    pub const KEYPAD_STEP: f32 = 30.0;

    /// Chance that a destroyed block drops a powerup (while budget remains)
    pub const POWERUP_SPAWN_CHANCE: f32 = 0.4;
    /// Powerup fall speed (pixels per tick)
    pub const POWERUP_FALL_SPEED: f32 = 2.0;

    /// Paddle hit pulse lifetime
    pub const PULSE_DURATION: Duration = Duration::from_millis(100);
}

