//! Powerups: spawning, falling, collection and timed effects
//!
//! Every in-force consequence of a pickup lives in one `Effects` list.
//! Flags such as "pierce is on" or "score multiplier is 2" are derived from
//! that list, never stored separately.

use std::time::Duration;

use glam::Vec2;
use rand::Rng;
use rand::seq::IndexedRandom;
use serde::{Deserialize, Serialize};

use super::state::{BallState, GameEvent, GameState};
use crate::consts::{POWERUP_FALL_SPEED, POWERUP_SPAWN_CHANCE};

/// Expand growth factor per pickup
const EXPAND_FACTOR: f32 = 1.8;
/// Ball velocity factor while slowed
const SLOW_FACTOR: f32 = 0.6;
/// Base points for a score pickup
const SCORE_PICKUP_POINTS: f32 = 5.0;
/// Score multiplier while the multiplier effect is active
const ACTIVE_MULTIPLIER: u32 = 2;

/// Power-up types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PowerupKind {
    Expand,
    Slow,
    Score,
    Shield,
    Multiplier,
    Sticky,
    Pierce,
}

impl PowerupKind {
    pub const ALL: [PowerupKind; 7] = [
        PowerupKind::Expand,
        PowerupKind::Slow,
        PowerupKind::Score,
        PowerupKind::Shield,
        PowerupKind::Multiplier,
        PowerupKind::Sticky,
        PowerupKind::Pierce,
    ];

    /// Relative probability mass when picking a type (sum = 115)
    pub fn weight(self) -> u32 {
        match self {
            PowerupKind::Expand => 25,
            PowerupKind::Slow => 20,
            PowerupKind::Score => 25,
            PowerupKind::Shield => 15,
            PowerupKind::Multiplier => 12,
            PowerupKind::Sticky => 10,
            PowerupKind::Pierce => 8,
        }
    }

    /// How long the effect stays in force. `None` means it has no timer.
    pub fn duration(self) -> Option<Duration> {
        match self {
            PowerupKind::Expand => Some(Duration::from_secs(10)),
            PowerupKind::Slow => Some(Duration::from_secs(6)),
            PowerupKind::Multiplier | PowerupKind::Sticky | PowerupKind::Pierce => {
                Some(Duration::from_secs(8))
            }
            PowerupKind::Score | PowerupKind::Shield => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PowerupKind::Expand => "expand",
            PowerupKind::Slow => "slow",
            PowerupKind::Score => "score",
            PowerupKind::Shield => "shield",
            PowerupKind::Multiplier => "multiplier",
            PowerupKind::Sticky => "sticky",
            PowerupKind::Pierce => "pierce",
        }
    }
}

/// A falling powerup
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Powerup {
    pub id: u32,
    pub kind: PowerupKind,
    /// Top-left corner
    pub pos: Vec2,
    /// Pixels per tick
    pub fall_speed: f32,
}

/// A powerup consequence currently in force
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ActiveEffect {
    /// Id of the powerup that created (or last refreshed) this effect
    pub id: u32,
    pub kind: PowerupKind,
    /// Session-clock expiry; `None` for effects consumed rather than timed out
    pub expires_at: Option<Duration>,
}

/// What the HUD shows for an active effect
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EffectIndicator {
    #[serde(rename = "type")]
    pub kind: PowerupKind,
    pub seconds_remaining: Option<f32>,
}

/// The canonical list of active effects
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Effects {
    list: Vec<ActiveEffect>,
}

impl Effects {
    pub fn is_active(&self, kind: PowerupKind) -> bool {
        self.list.iter().any(|e| e.kind == kind)
    }

    pub fn shield_armed(&self) -> bool {
        self.is_active(PowerupKind::Shield)
    }

    /// Current score multiplier (1 or 2, never stacking)
    pub fn multiplier(&self) -> u32 {
        if self.is_active(PowerupKind::Multiplier) {
            ACTIVE_MULTIPLIER
        } else {
            1
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &ActiveEffect> {
        self.list.iter()
    }

    pub fn len(&self) -> usize {
        self.list.len()
    }

    pub fn is_empty(&self) -> bool {
        self.list.is_empty()
    }

    /// Put an effect in force.
    ///
    /// Slow stacks (one record per pickup). Every other kind keeps a single
    /// record whose timer is re-armed. Returns true if a new record was added.
    pub fn arm(&mut self, id: u32, kind: PowerupKind, now: Duration) -> bool {
        let expires_at = kind.duration().map(|d| now + d);

        if kind != PowerupKind::Slow {
            if let Some(existing) = self.list.iter_mut().find(|e| e.kind == kind) {
                existing.id = id;
                existing.expires_at = expires_at;
                return false;
            }
        }

        self.list.push(ActiveEffect {
            id,
            kind,
            expires_at,
        });
        true
    }

    /// Disarm the shield. Returns false if none was armed.
    pub fn consume_shield(&mut self) -> bool {
        let before = self.list.len();
        self.list.retain(|e| e.kind != PowerupKind::Shield);
        self.list.len() != before
    }

    /// Remove and return every effect whose timer has elapsed
    pub fn take_expired(&mut self, now: Duration) -> Vec<ActiveEffect> {
        let (expired, live): (Vec<_>, Vec<_>) = self
            .list
            .drain(..)
            .partition(|e| e.expires_at.is_some_and(|t| t <= now));
        self.list = live;
        expired
    }

    /// Remove every effect, returning them for reverting
    pub fn take_all(&mut self) -> Vec<ActiveEffect> {
        std::mem::take(&mut self.list)
    }

    /// HUD view of the effects. Stacked slows collapse into one entry
    /// showing the longest remaining time.
    pub fn indicators(&self, now: Duration) -> Vec<EffectIndicator> {
        let mut out: Vec<EffectIndicator> = Vec::new();
        for effect in &self.list {
            let remaining = effect
                .expires_at
                .map(|t| t.saturating_sub(now).as_secs_f32());
            match out.iter_mut().find(|i| i.kind == effect.kind) {
                Some(existing) => {
                    existing.seconds_remaining =
                        match (existing.seconds_remaining, remaining) {
                            (Some(a), Some(b)) => Some(a.max(b)),
                            (a, b) => a.or(b),
                        };
                }
                None => out.push(EffectIndicator {
                    kind: effect.kind,
                    seconds_remaining: remaining,
                }),
            }
        }
        out
    }
}

/// Pick a powerup type by weight
pub fn pick_kind<R: Rng>(rng: &mut R) -> PowerupKind {
    PowerupKind::ALL
        .choose_weighted(rng, |k| k.weight())
        .copied()
        .unwrap_or(PowerupKind::Score)
}

/// Roll for a drop from a destroyed block, spending budget on success
pub fn roll_spawn<R: Rng>(rng: &mut R, budget: &mut u32) -> Option<PowerupKind> {
    if *budget == 0 {
        return None;
    }
    if rng.random::<f32>() > POWERUP_SPAWN_CHANCE {
        return None;
    }
    *budget -= 1;
    Some(pick_kind(rng))
}

/// Spawn a powerup centred on `center`
pub fn spawn_at(state: &mut GameState, kind: PowerupKind, center: Vec2) {
    let id = state.next_entity_id();
    let half = state.layout.powerup_size / 2.0;
    log::debug!("Powerup {} ({}) spawned at {:?}", id, kind.as_str(), center);
    state.powerups.push(Powerup {
        id,
        kind,
        pos: center - Vec2::splat(half),
        fall_speed: POWERUP_FALL_SPEED,
    });
    state.events.push(GameEvent::PowerupSpawned { kind });
}

/// Move every live powerup down one tick, collecting those that reach the
/// paddle and discarding those that leave the arena
pub fn advance_powerups(state: &mut GameState, now: Duration) {
    let size = state.layout.powerup_size;
    let paddle_top = state.layout.paddle_top();
    let paddle_bottom = paddle_top + state.paddle.height;
    let paddle_left = state.paddle.x;
    let paddle_right = state.paddle.x + state.paddle.width;
    let arena_height = state.layout.arena_height;

    let mut collected: Vec<Powerup> = Vec::new();
    state.powerups.retain_mut(|p| {
        p.pos.y += p.fall_speed;

        let touches_paddle = p.pos.y + size >= paddle_top
            && p.pos.y <= paddle_bottom
            && p.pos.x + size >= paddle_left
            && p.pos.x <= paddle_right;

        if touches_paddle {
            collected.push(p.clone());
            false
        } else {
            // Missed: gone once fully below the arena
            p.pos.y <= arena_height
        }
    });

    for powerup in collected {
        collect(state, &powerup, now);
    }
}

/// Apply a collected powerup
pub fn collect(state: &mut GameState, powerup: &Powerup, now: Duration) {
    log::debug!("Powerup {} ({}) collected", powerup.id, powerup.kind.as_str());
    state.events.push(GameEvent::PowerupCollected { kind: powerup.kind });

    match powerup.kind {
        PowerupKind::Score => {
            let points = (SCORE_PICKUP_POINTS * state.effects.multiplier() as f32).round();
            state.score += points as u64;
            return;
        }
        PowerupKind::Expand => {
            let grown = (state.paddle.width * EXPAND_FACTOR).min(state.layout.max_paddle_width());
            state.paddle.width = grown.max(state.paddle.width);
            state.clamp_paddle();
        }
        PowerupKind::Slow => {
            state.ball.vel *= SLOW_FACTOR;
        }
        PowerupKind::Shield
        | PowerupKind::Multiplier
        | PowerupKind::Sticky
        | PowerupKind::Pierce => {}
    }

    state.effects.arm(powerup.id, powerup.kind, now);
}

/// Undo an effect that is leaving the list
pub fn revert(state: &mut GameState, effect: &ActiveEffect) {
    log::debug!("Effect {} ({}) ended", effect.id, effect.kind.as_str());
    match effect.kind {
        PowerupKind::Expand => {
            state.paddle.width = state.paddle.base_width;
            state.clamp_paddle();
        }
        PowerupKind::Slow => {
            state.ball.vel /= SLOW_FACTOR;
        }
        PowerupKind::Sticky => {
            if matches!(state.ball.state, BallState::Attached { .. }) {
                state.ball.state = BallState::Free;
            }
        }
        PowerupKind::Score
        | PowerupKind::Shield
        | PowerupKind::Multiplier
        | PowerupKind::Pierce => {}
    }
}

/// Revert and drop every effect whose timer has elapsed
pub fn expire_effects(state: &mut GameState, now: Duration) {
    for effect in state.effects.take_expired(now) {
        revert(state, &effect);
    }
}
