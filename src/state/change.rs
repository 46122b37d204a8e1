// src/state/change.rs

//! Change: the top-level aggregate of one orchestration run.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::state::kind::TaskKind;
use crate::state::taskset::TaskSet;
use crate::state::{ChangeId, TaskId};

/// A failure recorded against one task of a change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskFailure {
    pub task: TaskId,
    pub kind: TaskKind,
    pub message: String,
}

/// Aggregate error for a failed change, listing every recorded task failure.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("cannot perform the following tasks:\n{}", format_failures(.failures))]
pub struct ChangeError {
    pub failures: Vec<TaskFailure>,
}

fn format_failures(failures: &[TaskFailure]) -> String {
    failures
        .iter()
        .map(|f| format!("- {} ({})", f.kind, f.message))
        .collect::<Vec<_>>()
        .join("\n")
}

/// One user-visible operation, owning the task sets produced for it.
///
/// The change accumulates task failures as the runner applies outcomes;
/// [`Change::err`] is authoritative and must be checked after every settle
/// call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Change {
    id: ChangeId,
    kind: String,
    summary: String,
    tasks: Vec<TaskId>,
    #[serde(default)]
    failures: Vec<TaskFailure>,
}

impl Change {
    pub(crate) fn new(id: ChangeId, kind: String, summary: String) -> Self {
        Self {
            id,
            kind,
            summary,
            tasks: Vec::new(),
            failures: Vec::new(),
        }
    }

    pub fn id(&self) -> &ChangeId {
        &self.id
    }

    pub fn kind(&self) -> &str {
        &self.kind
    }

    pub fn summary(&self) -> &str {
        &self.summary
    }

    /// Every task of the change, in the order the builder produced them.
    pub fn task_ids(&self) -> &[TaskId] {
        &self.tasks
    }

    pub(crate) fn add_task(&mut self, id: TaskId) {
        self.tasks.push(id);
    }

    pub(crate) fn add_task_set(&mut self, ts: &TaskSet) {
        for id in ts.tasks() {
            self.tasks.push(id.clone());
        }
    }

    pub(crate) fn record_failure(&mut self, failure: TaskFailure) {
        self.failures.push(failure);
    }

    /// `None` while no task of this change has failed, otherwise the
    /// aggregate of every recorded failure.
    pub fn err(&self) -> Option<ChangeError> {
        if self.failures.is_empty() {
            None
        } else {
            Some(ChangeError {
                failures: self.failures.clone(),
            })
        }
    }

    pub fn failures(&self) -> &[TaskFailure] {
        &self.failures
    }
}
