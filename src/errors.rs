// src/errors.rs

//! Crate-wide error aliases and helpers.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum SeedrunError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Task not found: {0}")]
    TaskNotFound(String),

    #[error("Change not found: {0}")]
    ChangeNotFound(String),

    #[error("Malformed task graph: {0}")]
    MalformedGraph(String),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error("State serialization error: {0}")]
    StateSerdeError(#[from] serde_json::Error),

    #[error(transparent)]
    Settle(#[from] SettleError),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Errors from the settle loop itself.
///
/// Task failures never show up here; they are recorded on the owning change
/// and read back through `Change::err`. This type only reports that the run
/// as a whole could not make progress or was stopped by the caller.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettleError {
    #[error("settle did not converge within {0:?}")]
    Timeout(std::time::Duration),

    #[error("settle run aborted")]
    Aborted,
}

pub use anyhow::Error;
pub type Result<T> = std::result::Result<T, SeedrunError>;
