// src/exec/handler.rs

//! Pluggable per-kind task handlers.
//!
//! The runner talks to handlers through [`TaskHandler`] and looks them up in
//! a [`HandlerRegistry`] keyed by [`TaskKind`]. Production embedders register
//! the real mount/link/copy/hook implementations; tests register fakes that
//! record what ran.

use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use serde_json::Value;

use crate::state::{ChangeId, TaskId, TaskKind};

/// Unlocked snapshot of a task handed to its handler.
///
/// Handlers never see the live state; they get a copy of what they need and
/// report back a single success-or-failure outcome.
#[derive(Debug, Clone)]
pub struct TaskView {
    pub task: TaskId,
    pub change: ChangeId,
    pub kind: TaskKind,
    pub params: Value,
}

/// Trait abstracting the side effect behind one task kind.
///
/// The engine treats the call as opaque: it either succeeds or fails, and a
/// failure's rendered message is what ends up on the task and its change.
pub trait TaskHandler: Send + Sync {
    fn run(
        &self,
        view: TaskView,
    ) -> Pin<Box<dyn Future<Output = anyhow::Result<()>> + Send + '_>>;
}

/// Adapter so plain async closures can serve as handlers.
pub struct FnHandler<F>(pub F);

impl<F, Fut> TaskHandler for FnHandler<F>
where
    F: Fn(TaskView) -> Fut + Send + Sync,
    Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
{
    fn run(
        &self,
        view: TaskView,
    ) -> Pin<Box<dyn Future<Output = anyhow::Result<()>> + Send + '_>> {
        Box::pin((self.0)(view))
    }
}

/// Lookup table from task kind to handler.
#[derive(Default, Clone)]
pub struct HandlerRegistry {
    handlers: HashMap<TaskKind, Arc<dyn TaskHandler>>,
}

impl HandlerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register (or replace) the handler for a kind.
    pub fn register(&mut self, kind: TaskKind, handler: Arc<dyn TaskHandler>) {
        self.handlers.insert(kind, handler);
    }

    pub fn handler_for(&self, kind: TaskKind) -> Option<Arc<dyn TaskHandler>> {
        self.handlers.get(&kind).cloned()
    }

    pub fn is_registered(&self, kind: TaskKind) -> bool {
        self.handlers.contains_key(&kind)
    }
}

impl fmt::Debug for HandlerRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HandlerRegistry")
            .field("kinds", &self.handlers.keys().collect::<Vec<_>>())
            .finish_non_exhaustive()
    }
}
