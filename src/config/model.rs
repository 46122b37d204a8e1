// src/config/model.rs

use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;

use crate::engine::SettleOptions;
use crate::errors::SeedrunError;

/// Top-level configuration as read from a TOML file.
///
/// ```toml
/// [settle]
/// timeout_secs = 120
/// poll_interval_ms = 25
/// max_workers = 8
///
/// [persist]
/// snapshot_path = "/var/lib/seedrun/state.json"
/// ```
///
/// All sections are optional and have reasonable defaults.
#[derive(Debug, Clone, Deserialize)]
pub struct RawEngineConfig {
    #[serde(default)]
    pub settle: SettleSection,

    #[serde(default)]
    pub persist: PersistSection,
}

/// `[settle]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct SettleSection {
    /// Upper bound for one settle call, in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Pause between passes over an idle but unconverged graph, in
    /// milliseconds.
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,

    /// Maximum number of concurrently running handlers.
    #[serde(default = "default_max_workers")]
    pub max_workers: usize,
}

fn default_timeout_secs() -> u64 {
    120
}

fn default_poll_interval_ms() -> u64 {
    25
}

fn default_max_workers() -> usize {
    8
}

impl Default for SettleSection {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout_secs(),
            poll_interval_ms: default_poll_interval_ms(),
            max_workers: default_max_workers(),
        }
    }
}

/// `[persist]` section.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PersistSection {
    /// Where state snapshots are written; `None` disables persistence.
    #[serde(default)]
    pub snapshot_path: Option<PathBuf>,
}

/// Validated configuration.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    pub settle: SettleSection,
    pub persist: PersistSection,
}

impl EngineConfig {
    /// Settle policy in the engine's terms.
    pub fn settle_options(&self) -> SettleOptions {
        SettleOptions {
            timeout: Duration::from_secs(self.settle.timeout_secs),
            poll_interval: Duration::from_millis(self.settle.poll_interval_ms),
            max_workers: self.settle.max_workers,
        }
    }
}

impl TryFrom<RawEngineConfig> for EngineConfig {
    type Error = SeedrunError;

    fn try_from(raw: RawEngineConfig) -> Result<Self, Self::Error> {
        if raw.settle.max_workers == 0 {
            return Err(SeedrunError::ConfigError(
                "[settle].max_workers must be >= 1 (got 0)".to_string(),
            ));
        }
        if raw.settle.timeout_secs == 0 {
            return Err(SeedrunError::ConfigError(
                "[settle].timeout_secs must be >= 1 (got 0)".to_string(),
            ));
        }
        Ok(EngineConfig {
            settle: raw.settle,
            persist: raw.persist,
        })
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            settle: SettleSection::default(),
            persist: PersistSection::default(),
        }
    }
}
