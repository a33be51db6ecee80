//! Layout provider
//!
//! Turns screen dimensions into the fixed sizes the simulation consumes.
//! The simulation never does pixel math of its own beyond these numbers.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::consts::{BLOCK_COLUMNS, BLOCK_GRID_TOP};

/// Reference screen used for defaults
pub const DEFAULT_SCREEN_WIDTH: f32 = 400.0;
pub const DEFAULT_SCREEN_HEIGHT: f32 = 800.0;

/// Smallest screen the formulas are tuned for
const MIN_SCREEN_WIDTH: f32 = 320.0;
const MIN_SCREEN_HEIGHT: f32 = 480.0;

/// Fixed gap between blocks (and between the grid and the side walls)
const BLOCK_SPACING: f32 = 6.0;

/// Numeric layout of the arena and everything in it (pixels)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Layout {
    pub paddle_width: f32,
    pub paddle_height: f32,
    /// Gap between the paddle bottom and the arena bottom
    pub paddle_bottom: f32,
    pub ball_size: f32,
    pub powerup_size: f32,
    pub block_width: f32,
    pub block_height: f32,
    pub block_spacing: f32,
    /// Blocks per grid row
    pub block_columns: usize,
    pub arena_width: f32,
    pub arena_height: f32,
    /// Height of the drag zone below the arena content (presentation only)
    pub touch_zone_height: f32,
}

impl Default for Layout {
    fn default() -> Self {
        Self::calculate(DEFAULT_SCREEN_WIDTH, DEFAULT_SCREEN_HEIGHT)
    }
}

impl Layout {
    /// Compute a layout for the given screen size
    pub fn calculate(screen_width: f32, screen_height: f32) -> Self {
        Self::with_columns(screen_width, screen_height, BLOCK_COLUMNS)
    }

    /// Compute a layout whose block grid has `columns` blocks per row
    pub fn with_columns(screen_width: f32, screen_height: f32, columns: usize) -> Self {
        let block_columns = columns.max(1);
        let w = screen_width.max(MIN_SCREEN_WIDTH);
        let h = screen_height.max(MIN_SCREEN_HEIGHT);

        // Scale harder on very small/large screens (400 px reference)
        let min_dim = w.min(h);
        let density = min_dim / 400.0;

        let columns = block_columns as f32;

        Self {
            paddle_width: (w * 0.16 * density).round().clamp(60.0, 180.0),
            paddle_height: (h * 0.025).round().max(8.0),
            paddle_bottom: (h * 0.11).round().max(30.0),
            ball_size: (min_dim * 0.032).round().max(10.0),
            powerup_size: (w * 0.036).round().max(10.0),
            block_width: ((w - (columns + 1.0) * BLOCK_SPACING) / columns).floor(),
            block_height: (h * 0.022).round().max(12.0),
            block_spacing: BLOCK_SPACING,
            block_columns,
            arena_width: w,
            arena_height: h,
            touch_zone_height: (h * 0.2).round().max(90.0),
        }
    }

    /// Replace every non-finite or non-positive field by its default
    pub fn sanitized(self) -> Self {
        let defaults = Self::default();
        let pick = |name: &str, value: f32, fallback: f32| {
            if value.is_finite() && value > 0.0 {
                value
            } else {
                log::warn!("Layout field {name} = {value} is invalid, using {fallback}");
                fallback
            }
        };

        Self {
            paddle_width: pick("paddleWidth", self.paddle_width, defaults.paddle_width),
            paddle_height: pick("paddleHeight", self.paddle_height, defaults.paddle_height),
            paddle_bottom: pick("paddleBottom", self.paddle_bottom, defaults.paddle_bottom),
            ball_size: pick("ballSize", self.ball_size, defaults.ball_size),
            powerup_size: pick("powerupSize", self.powerup_size, defaults.powerup_size),
            block_width: pick("blockWidth", self.block_width, defaults.block_width),
            block_height: pick("blockHeight", self.block_height, defaults.block_height),
            block_spacing: pick("blockSpacing", self.block_spacing, defaults.block_spacing),
            block_columns: if self.block_columns > 0 {
                self.block_columns
            } else {
                log::warn!(
                    "Layout field blockColumns = 0 is invalid, using {}",
                    defaults.block_columns
                );
                defaults.block_columns
            },
            arena_width: pick("arenaWidth", self.arena_width, defaults.arena_width),
            arena_height: pick("arenaHeight", self.arena_height, defaults.arena_height),
            touch_zone_height: pick(
                "touchZoneHeight",
                self.touch_zone_height,
                defaults.touch_zone_height,
            ),
        }
    }

    /// Y coordinate of the paddle's top surface
    #[inline]
    pub fn paddle_top(&self) -> f32 {
        self.arena_height - self.paddle_bottom - self.paddle_height
    }

    /// Largest legal paddle x for a paddle of the given width
    #[inline]
    pub fn max_paddle_x(&self, paddle_width: f32) -> f32 {
        (self.arena_width - paddle_width).max(0.0)
    }

    /// Top-left corner of the block at (column, row)
    pub fn block_origin(&self, column: usize, row: usize) -> Vec2 {
        Vec2::new(
            self.block_spacing + column as f32 * (self.block_width + self.block_spacing),
            BLOCK_GRID_TOP + row as f32 * (self.block_height + self.block_spacing),
        )
    }

    /// Widest the paddle may grow (expand powerup cap)
    #[inline]
    pub fn max_paddle_width(&self) -> f32 {
        self.arena_width * 0.7
    }
}
