//! Collision detection and response
//!
//! Pure functions over positions and sizes. Every entity is an axis-aligned
//! box whose `pos` is its top-left corner; y grows downward.

use glam::Vec2;

use super::state::Block;
use crate::consts::{PADDLE_BOOST, PADDLE_HIT_BAND, PADDLE_MAX_ANGLE_DEG};

/// Which velocity component a block hit flips
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BounceAxis {
    /// Side hit: invert dx
    Horizontal,
    /// Top/bottom hit: invert dy
    Vertical,
}

/// Result of a paddle bounce
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PaddleHit {
    /// Ball resting exactly on the paddle top
    pub pos: Vec2,
    /// Launch velocity (always upward)
    pub vel: Vec2,
    /// Where along the paddle the ball landed (0 = left edge, 1 = right edge)
    pub hit_ratio: f32,
}

/// Blocks destroyed by one ball step
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BlockHits {
    /// Indices into the block list, in list order
    pub destroyed: Vec<usize>,
    /// Ball velocity after every bounce was applied
    pub vel: Vec2,
}

/// Inclusive AABB overlap test
#[inline]
pub fn aabb_overlap(a_pos: Vec2, a_size: Vec2, b_pos: Vec2, b_size: Vec2) -> bool {
    a_pos.x + a_size.x >= b_pos.x
        && a_pos.x <= b_pos.x + b_size.x
        && a_pos.y + a_size.y >= b_pos.y
        && a_pos.y <= b_pos.y + b_size.y
}

/// Reflect off the side and top walls.
///
/// Returns the corrected position (pulled back inside the arena) and the
/// new velocity. The bottom edge is not a wall.
pub fn wall_bounce(pos: Vec2, vel: Vec2, ball_size: f32, arena_width: f32) -> (Vec2, Vec2) {
    let mut pos = pos;
    let mut vel = vel;
    let max_x = (arena_width - ball_size).max(0.0);

    if pos.x <= 0.0 || pos.x >= max_x {
        vel.x = -vel.x;
        pos.x = pos.x.clamp(0.0, max_x);
    }
    if pos.y <= 0.0 {
        vel.y = -vel.y;
        pos.y = 0.0;
    }

    (pos, vel)
}

/// Check the ball against the paddle's top surface.
///
/// A hit needs the ball's bottom edge inside a thin band starting at the
/// paddle top, and the ball's center within the paddle's span.
pub fn paddle_hit(
    pos: Vec2,
    vel: Vec2,
    ball_size: f32,
    paddle_x: f32,
    paddle_width: f32,
    paddle_top: f32,
) -> Option<PaddleHit> {
    let ball_bottom = pos.y + ball_size;
    let center_x = pos.x + ball_size / 2.0;

    let in_band = ball_bottom >= paddle_top && ball_bottom <= paddle_top + PADDLE_HIT_BAND;
    let over_paddle = center_x >= paddle_x && center_x <= paddle_x + paddle_width;
    if !(in_band && over_paddle) {
        return None;
    }

    let hit_ratio = ((center_x - paddle_x) / paddle_width).clamp(0.0, 1.0);
    let angle = ((hit_ratio - 0.5) * 2.0 * PADDLE_MAX_ANGLE_DEG).to_radians();
    let speed = vel.length() * PADDLE_BOOST;

    Some(PaddleHit {
        pos: Vec2::new(pos.x, paddle_top - ball_size),
        vel: Vec2::new(angle.sin() * speed, -(angle.cos() * speed).abs()),
        hit_ratio,
    })
}

/// Decide the bounce axis from penetration depth.
///
/// More horizontal penetration than vertical means the ball came in from
/// the side.
pub fn block_bounce_axis(
    ball_pos: Vec2,
    ball_size: f32,
    block_pos: Vec2,
    block_size: Vec2,
) -> BounceAxis {
    let ball_max = ball_pos + Vec2::splat(ball_size);
    let block_max = block_pos + block_size;

    let overlap_x = (ball_max.x - block_pos.x).min(block_max.x - ball_pos.x);
    let overlap_y = (ball_max.y - block_pos.y).min(block_max.y - ball_pos.y);

    if overlap_x < overlap_y {
        BounceAxis::Horizontal
    } else {
        BounceAxis::Vertical
    }
}

/// Test the ball against every visible block.
///
/// All blocks are checked against the same pre-step list, so several blocks
/// can break in one step and each applies its own bounce. With `pierce` the
/// ball keeps its velocity.
pub fn resolve_blocks(
    ball_pos: Vec2,
    vel: Vec2,
    ball_size: f32,
    blocks: &[Block],
    block_size: Vec2,
    pierce: bool,
) -> BlockHits {
    let mut hits = BlockHits {
        destroyed: Vec::new(),
        vel,
    };
    let ball_extent = Vec2::splat(ball_size);

    for (index, block) in blocks.iter().enumerate() {
        if !block.visible {
            continue;
        }
        if !aabb_overlap(ball_pos, ball_extent, block.pos, block_size) {
            continue;
        }

        hits.destroyed.push(index);
        if pierce {
            continue;
        }
        match block_bounce_axis(ball_pos, ball_size, block.pos, block_size) {
            BounceAxis::Horizontal => hits.vel.x = -hits.vel.x,
            BounceAxis::Vertical => hits.vel.y = -hits.vel.y,
        }
    }

    hits
}
