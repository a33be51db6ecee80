//! Game settings and preferences
//!
//! Stored as JSON. Missing fields take their defaults; an unreadable file
//! falls back to defaults entirely.

use std::fmt;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::layout::Layout;
use crate::sim::Difficulty;

/// Why settings could not be loaded or saved
#[derive(Debug)]
pub enum ConfigError {
    Io(std::io::Error),
    Parse(serde_json::Error),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Io(e) => write!(f, "settings I/O error: {e}"),
            ConfigError::Parse(e) => write!(f, "settings parse error: {e}"),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::Io(e) => Some(e),
            ConfigError::Parse(e) => Some(e),
        }
    }
}

impl From<std::io::Error> for ConfigError {
    fn from(e: std::io::Error) -> Self {
        ConfigError::Io(e)
    }
}

impl From<serde_json::Error> for ConfigError {
    fn from(e: serde_json::Error) -> Self {
        ConfigError::Parse(e)
    }
}

/// Game settings/preferences
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Difficulty the demo/quick-start uses
    pub difficulty: Difficulty,
    /// RNG seed; `None` picks one from the system clock
    pub seed: Option<u64>,

    // === Audio ===
    /// Master volume (0.0 - 1.0)
    pub master_volume: f32,
    /// Sound effects volume (0.0 - 1.0)
    pub sfx_volume: f32,
    /// Music volume (0.0 - 1.0)
    pub music_volume: f32,
    pub muted: bool,

    // === Play ===
    /// Let the paddle play itself
    pub autopilot: bool,
    /// Fixed layout instead of one computed from the screen
    pub layout: Option<Layout>,
    /// Screen size used when no fixed layout is given
    pub screen_width: f32,
    pub screen_height: f32,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            difficulty: Difficulty::Medium,
            seed: None,

            // Audio
            master_volume: 0.8,
            sfx_volume: 0.7,
            music_volume: 0.3,
            muted: false,

            // Play
            autopilot: false,
            layout: None,
            screen_width: crate::layout::DEFAULT_SCREEN_WIDTH,
            screen_height: crate::layout::DEFAULT_SCREEN_HEIGHT,
        }
    }
}

impl Settings {
    /// Layout to run with
    pub fn resolve_layout(&self) -> Layout {
        match self.layout {
            Some(layout) => layout.sanitized(),
            None => Layout::calculate(self.screen_width, self.screen_height),
        }
    }

    /// Parse settings from JSON text
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Load settings from a JSON file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let json = fs::read_to_string(path)?;
        let settings = Self::from_json(&json)?;
        log::info!("Loaded settings from {}", path.display());
        Ok(settings)
    }

    /// Load settings, falling back to defaults on any error
    pub fn load_or_default(path: &Path) -> Self {
        match Self::load(path) {
            Ok(settings) => settings,
            Err(e) => {
                log::warn!("Using default settings ({e})");
                Self::default()
            }
        }
    }

    /// Save settings as pretty JSON
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        log::info!("Settings saved to {}", path.display());
        Ok(())
    }
}
