// src/lib.rs

pub mod config;
pub mod engine;
pub mod errors;
pub mod exec;
pub mod graph;
pub mod logging;
pub mod state;

use std::sync::Arc;

use parking_lot::Mutex;
use tracing::info;

use crate::engine::{SettleOptions, SettleRunner};
use crate::errors::Result;
use crate::exec::HandlerRegistry;
use crate::graph::{build_seed_change, BuildOptions, SeedPackage};
use crate::state::{ChangeId, State};

/// High-level entry point: build the seeding change for `packages` and
/// settle it to convergence.
///
/// This wires together:
/// - the graph builder (ordering rules, preseed wiring)
/// - the settle runner (bounded worker pool, timeout policy)
/// - the caller-supplied handler registry
///
/// The caller keeps ownership of `state` and must inspect the change's
/// `err()` afterwards; handler failures never surface through the returned
/// error, only settle-level problems (timeout) do.
pub async fn seed_and_settle(
    state: Arc<Mutex<State>>,
    packages: &[SeedPackage],
    build: &BuildOptions,
    registry: Arc<HandlerRegistry>,
    settle: SettleOptions,
) -> Result<ChangeId> {
    let change = {
        let mut st = state.lock();
        let (change, tasksets) = build_seed_change(&mut st, packages, build)?;
        info!(
            change = %change,
            task_sets = tasksets.len(),
            preseed = build.preseed,
            "seed change created"
        );
        change
    };

    let runner = SettleRunner::new(state, registry, settle);
    runner.settle(&change).await?;

    Ok(change)
}
