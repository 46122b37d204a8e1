// src/state/task.rs

//! A single schedulable unit of work.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::state::kind::TaskKind;
use crate::state::status::Status;
use crate::state::{ChangeId, TaskId};

/// One unit of work with a kind, a status and two directed edge sets.
///
/// Edges are maintained in both directions by `State::add_wait`: `wait_for`
/// is authoritative ("this task cannot start until those are done"), and
/// `halt_on` is the derived inverse kept for O(1) traversal of dependents.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Task {
    id: TaskId,
    kind: TaskKind,
    summary: String,
    status: Status,
    /// Opaque payload handed to the handler; the engine never interprets it.
    #[serde(default)]
    params: Value,
    #[serde(default)]
    wait_for: Vec<TaskId>,
    #[serde(default)]
    halt_on: Vec<TaskId>,
    change: Option<ChangeId>,
    /// A checkpoint task's `Doing` status is a valid end state for a run.
    #[serde(default)]
    checkpoint: bool,
    /// Messages recorded against the task (handler errors, dependency
    /// failures).
    #[serde(default)]
    log: Vec<String>,
}

impl Task {
    pub(crate) fn new(id: TaskId, kind: TaskKind, summary: String) -> Self {
        Self {
            id,
            kind,
            summary,
            status: Status::Do,
            params: Value::Null,
            wait_for: Vec::new(),
            halt_on: Vec::new(),
            change: None,
            checkpoint: false,
            log: Vec::new(),
        }
    }

    pub fn id(&self) -> &TaskId {
        &self.id
    }

    pub fn kind(&self) -> TaskKind {
        self.kind
    }

    pub fn summary(&self) -> &str {
        &self.summary
    }

    pub fn status(&self) -> Status {
        self.status
    }

    pub fn set_status(&mut self, status: Status) {
        self.status = status;
    }

    pub fn params(&self) -> &Value {
        &self.params
    }

    pub fn set_params(&mut self, params: Value) {
        self.params = params;
    }

    /// Tasks this task cannot start before, in the order they were added.
    pub fn wait_tasks(&self) -> &[TaskId] {
        &self.wait_for
    }

    /// Tasks that list this task in their wait set.
    pub fn halt_tasks(&self) -> &[TaskId] {
        &self.halt_on
    }

    /// The change this task belongs to, once bound.
    pub fn change(&self) -> Option<&ChangeId> {
        self.change.as_ref()
    }

    /// Whether `Doing` is a valid end state for a run of this task.
    pub fn is_checkpoint(&self) -> bool {
        self.checkpoint
    }

    pub fn set_checkpoint(&mut self, checkpoint: bool) {
        self.checkpoint = checkpoint;
    }

    /// Messages recorded against this task, oldest first.
    pub fn log(&self) -> &[String] {
        &self.log
    }

    pub(crate) fn add_log(&mut self, message: String) {
        self.log.push(message);
    }

    pub(crate) fn bind_change(&mut self, change: ChangeId) {
        self.change = Some(change);
    }

    /// Returns `false` if the edge was already present.
    pub(crate) fn push_wait(&mut self, dep: &TaskId) -> bool {
        if self.wait_for.iter().any(|d| d == dep) {
            return false;
        }
        self.wait_for.push(dep.clone());
        true
    }

    pub(crate) fn push_halt(&mut self, dependent: &TaskId) {
        if !self.halt_on.iter().any(|d| d == dependent) {
            self.halt_on.push(dependent.clone());
        }
    }

    pub(crate) fn remove_edges_to(&mut self, gone: &std::collections::BTreeSet<TaskId>) {
        self.wait_for.retain(|id| !gone.contains(id));
        self.halt_on.retain(|id| !gone.contains(id));
    }
}
