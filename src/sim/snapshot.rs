//! Read-only per-frame view for the presentation layer

use std::time::Duration;

use serde::Serialize;

use super::powerup::{EffectIndicator, PowerupKind};
use super::state::{Difficulty, GamePhase, GameState};

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BallView {
    pub x: f32,
    pub y: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PaddleView {
    pub x: f32,
    pub width: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BlockView {
    pub x: f32,
    pub y: f32,
    pub visible: bool,
    pub color: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PowerupView {
    pub x: f32,
    pub y: f32,
    #[serde(rename = "type")]
    pub kind: PowerupKind,
}

/// Everything a renderer needs for one frame
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    pub ball: BallView,
    pub paddle: PaddleView,
    pub blocks: Vec<BlockView>,
    pub powerups: Vec<PowerupView>,
    pub active_effects: Vec<EffectIndicator>,
    /// Whether a paddle-hit pulse is showing
    pub pulse: bool,
    pub score: u64,
    pub last_score: Option<u64>,
    pub game_state: GamePhase,
    pub difficulty: Difficulty,
}

impl Snapshot {
    pub fn capture(state: &GameState, now: Duration) -> Self {
        Self {
            ball: BallView {
                x: state.ball.pos.x,
                y: state.ball.pos.y,
            },
            paddle: PaddleView {
                x: state.paddle.x,
                width: state.paddle.width,
            },
            blocks: state
                .blocks
                .iter()
                .map(|b| BlockView {
                    x: b.pos.x,
                    y: b.pos.y,
                    visible: b.visible,
                    color: b.color,
                })
                .collect(),
            powerups: state
                .powerups
                .iter()
                .map(|p| PowerupView {
                    x: p.pos.x,
                    y: p.pos.y,
                    kind: p.kind,
                })
                .collect(),
            active_effects: state.effects.indicators(now),
            pulse: state.pulses.iter().any(|p| p.expires_at > now),
            score: state.score,
            last_score: state.last_score,
            game_state: state.phase,
            difficulty: state.difficulty,
        }
    }
}
