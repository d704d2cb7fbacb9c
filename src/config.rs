//! Configuration for the slot playback engine.
//!
//! Loaded from `<config_dir>/slotplay/config.toml`. Every field has a
//! default, so a missing file or a partial file is fine:
//!
//! ```toml
//! [playback]
//! speed = 2.0
//! mode = "single"
//! autoplay = true
//! initial_slot = 9000000
//!
//! [ticker]
//! frame_rate = 60
//!
//! [clock]
//! genesis_unix_secs = 1606824023
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::clock::MAINNET_GENESIS_UNIX_SECS;
use crate::player::{clamp_speed, PlaybackMode};

/// Lowest accepted ticker frame rate (activations per second)
pub const MIN_FRAME_RATE: u32 = 1;
/// Highest accepted ticker frame rate
pub const MAX_FRAME_RATE: u32 = 240;

/// Top-level configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub playback: PlaybackSettings,
    pub ticker: TickerSettings,
    pub clock: ClockSettings,
}

/// Initial playback settings applied when the engine is created.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlaybackSettings {
    /// Speed multiplier, clamped to [0.1, 10]
    pub speed: f64,
    /// Continuous or single-slot stepping
    pub mode: PlaybackMode,
    /// Start playing as soon as bounds first resolve
    pub autoplay: bool,
    /// Explicit starting slot (defaults to the live edge)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub initial_slot: Option<u64>,
}

impl Default for PlaybackSettings {
    fn default() -> Self {
        Self {
            speed: 1.0,
            mode: PlaybackMode::Continuous,
            autoplay: false,
            initial_slot: None,
        }
    }
}

/// Frame ticker settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TickerSettings {
    /// Target activations per second
    pub frame_rate: u32,
}

impl Default for TickerSettings {
    fn default() -> Self {
        Self { frame_rate: 60 }
    }
}

/// Wall clock settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClockSettings {
    /// Chain genesis as a unix timestamp (seconds)
    pub genesis_unix_secs: i64,
}

impl Default for ClockSettings {
    fn default() -> Self {
        Self {
            genesis_unix_secs: MAINNET_GENESIS_UNIX_SECS,
        }
    }
}

impl Config {
    /// Path of the user configuration file.
    pub fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir().context("Could not determine config directory")?;
        Ok(config_dir.join("slotplay").join("config.toml"))
    }

    /// Load the user configuration, falling back to defaults if absent.
    pub fn load() -> Result<Self> {
        let path = Self::config_path()?;
        if !path.exists() {
            tracing::debug!(path = %path.display(), "no config file, using defaults");
            return Ok(Self::default());
        }
        Self::load_from(&path)
    }

    /// Load configuration from an explicit file.
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        Self::from_toml_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    /// Parse configuration from TOML text and normalize out-of-range values.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: Config = toml::from_str(content)?;
        Ok(config.normalized())
    }

    /// Clamp every field into its accepted range.
    pub fn normalized(mut self) -> Self {
        self.playback.speed = clamp_speed(self.playback.speed);
        self.ticker.frame_rate = self.ticker.frame_rate.clamp(MIN_FRAME_RATE, MAX_FRAME_RATE);
        self
    }
}
