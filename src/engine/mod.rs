// src/engine/mod.rs

//! The settle engine.
//!
//! [`settle::SettleRunner`] drains a change: it repeatedly collects runnable
//! tasks (every wait edge `Done`), dispatches their handlers on a bounded
//! worker pool, applies outcomes, and stops once the change converges, the
//! deadline passes, or the caller aborts.

use std::time::Duration;

/// Outcome of one dispatched task handler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskOutcome {
    Success,
    Failed(String),
}

/// Settle policy: how long to keep trying, how often to re-check an idle
/// graph, and how many handlers may run at once.
///
/// These are configuration, not constants; `config::EngineConfig` carries
/// them for embedders that load policy from a file.
#[derive(Debug, Clone, Copy)]
pub struct SettleOptions {
    /// Upper bound for one settle call.
    pub timeout: Duration,
    /// Pause between passes over an idle but unconverged graph.
    pub poll_interval: Duration,
    /// Maximum number of concurrently running handlers.
    pub max_workers: usize,
}

impl Default for SettleOptions {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(120),
            poll_interval: Duration::from_millis(25),
            max_workers: 8,
        }
    }
}

pub mod settle;

pub use settle::SettleRunner;
