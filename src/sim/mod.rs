//! Deterministic simulation module
//!
//! All gameplay logic lives here. This module must be pure and deterministic:
//! - Fixed timestep only
//! - Seeded RNG only
//! - Effect timers measured against a caller-supplied clock
//! - No rendering, audio or platform dependencies

pub mod collision;
pub mod powerup;
pub mod snapshot;
pub mod state;
pub mod tick;

pub use collision::{BlockHits, BounceAxis, PaddleHit, paddle_hit, resolve_blocks, wall_bounce};
pub use powerup::{ActiveEffect, EffectIndicator, Effects, Powerup, PowerupKind};
pub use snapshot::Snapshot;
pub use state::{
    Ball, BallState, Block, Difficulty, GameEvent, GamePhase, GameState, Paddle, PaddleCommand,
    Pulse,
};
pub use tick::{TickInput, tick};
