// src/config/loader.rs

use std::fs;
use std::path::Path;

use crate::config::model::{EngineConfig, RawEngineConfig};
use crate::errors::Result;

/// Load a configuration file from a given path and return the raw
/// `RawEngineConfig`.
///
/// This only performs TOML deserialization; it does **not** perform semantic
/// validation. Use [`load_and_validate`] for that.
pub fn load_from_path(path: impl AsRef<Path>) -> Result<RawEngineConfig> {
    let path = path.as_ref();
    let contents = fs::read_to_string(path)?;

    let config: RawEngineConfig = toml::from_str(&contents)?;

    Ok(config)
}

/// Load a configuration file from path and run validation.
///
/// This is the recommended entry point for embedders:
///
/// - Reads TOML.
/// - Applies defaults (handled by `serde` + `Default` impls).
/// - Checks ranges (worker bound and timeout must be non-zero).
pub fn load_and_validate(path: impl AsRef<Path>) -> Result<EngineConfig> {
    let raw = load_from_path(&path)?;
    let config = EngineConfig::try_from(raw)?;
    Ok(config)
}
