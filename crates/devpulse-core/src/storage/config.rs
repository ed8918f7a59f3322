//! TOML-based application configuration.
//!
//! Stores engine tunables and host defaults:
//! - Score component weights
//! - Streak grace / freeze parameters
//! - Default user for CLI sync runs
//!
//! Configuration lives at `<data_dir>/config.toml`.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use super::data_dir;
use crate::error::ConfigError;
use crate::score::ScoreWeights;
use crate::streak::StreakTracker;

/// Score weighting configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoringConfig {
    #[serde(default = "default_building_ratio")]
    pub building_ratio: f64,
    #[serde(default = "default_consistency")]
    pub consistency: f64,
    #[serde(default = "default_shipping_frequency")]
    pub shipping_frequency: f64,
    #[serde(default = "default_focus_depth")]
    pub focus_depth: f64,
    #[serde(default = "default_recovery_balance")]
    pub recovery_balance: f64,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        let weights = ScoreWeights::standard();
        Self {
            building_ratio: weights.building_ratio,
            consistency: weights.consistency,
            shipping_frequency: weights.shipping_frequency,
            focus_depth: weights.focus_depth,
            recovery_balance: weights.recovery_balance,
        }
    }
}

impl ScoringConfig {
    pub fn weights(&self) -> ScoreWeights {
        ScoreWeights {
            building_ratio: self.building_ratio,
            consistency: self.consistency,
            shipping_frequency: self.shipping_frequency,
            focus_depth: self.focus_depth,
            recovery_balance: self.recovery_balance,
        }
    }
}

/// Streak rule configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StreakConfig {
    /// Full missed calendar days tolerated before a streak breaks.
    #[serde(default = "default_grace_days")]
    pub grace_days: i64,
    #[serde(default = "default_freeze_cap")]
    pub freeze_cap: u8,
    #[serde(default = "default_freeze_earn_interval")]
    pub freeze_earn_interval: u32,
}

impl Default for StreakConfig {
    fn default() -> Self {
        let tracker = StreakTracker::default();
        Self {
            grace_days: tracker.grace_days,
            freeze_cap: tracker.freeze_cap,
            freeze_earn_interval: tracker.freeze_earn_interval,
        }
    }
}

impl StreakConfig {
    pub fn tracker(&self) -> StreakTracker {
        StreakTracker {
            grace_days: self.grace_days,
            freeze_cap: self.freeze_cap,
            freeze_earn_interval: self.freeze_earn_interval,
        }
    }
}

fn default_building_ratio() -> f64 {
    0.30
}
fn default_consistency() -> f64 {
    0.25
}
fn default_shipping_frequency() -> f64 {
    0.20
}
fn default_focus_depth() -> f64 {
    0.15
}
fn default_recovery_balance() -> f64 {
    0.10
}
fn default_grace_days() -> i64 {
    1
}
fn default_freeze_cap() -> u8 {
    3
}
fn default_freeze_earn_interval() -> u32 {
    7
}

/// Sync defaults for the CLI host.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SyncConfig {
    /// User id assumed when `--user` is omitted.
    #[serde(default)]
    pub default_user: Option<String>,
}

/// Application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub scoring: ScoringConfig,
    #[serde(default)]
    pub streak: StreakConfig,
    #[serde(default)]
    pub sync: SyncConfig,
}

impl Config {
    /// Path to the config file.
    pub fn path() -> Result<PathBuf, Box<dyn std::error::Error>> {
        Ok(data_dir()?.join("config.toml"))
    }

    /// Load from disk, falling back to defaults when the file is absent.
    pub fn load() -> Result<Self, Box<dyn std::error::Error>> {
        let path = Self::path()?;
        if !path.exists() {
            return Ok(Self::default());
        }
        let raw = std::fs::read_to_string(&path).map_err(|e| ConfigError::LoadFailed {
            path: path.clone(),
            message: e.to_string(),
        })?;
        let config: Config = toml::from_str(&raw).map_err(|e| ConfigError::LoadFailed {
            path,
            message: e.to_string(),
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Write to disk.
    pub fn save(&self) -> Result<(), Box<dyn std::error::Error>> {
        let path = Self::path()?;
        let raw = toml::to_string_pretty(self).map_err(|e| ConfigError::SaveFailed {
            path: path.clone(),
            message: e.to_string(),
        })?;
        std::fs::write(&path, raw).map_err(|e| ConfigError::SaveFailed {
            path,
            message: e.to_string(),
        })?;
        Ok(())
    }

    /// Reject weight values outside [0, 1].
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.scoring
            .weights()
            .validate()
            .map_err(|message| ConfigError::InvalidValue {
                key: "scoring".to_string(),
                message,
            })
    }
}
