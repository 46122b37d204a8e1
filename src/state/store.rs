// src/state/store.rs

//! The persisted, lockable store holding all tasks and changes.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::state::change::Change;
use crate::state::kind::TaskKind;
use crate::state::status::Status;
use crate::state::task::Task;
use crate::state::taskset::TaskSet;
use crate::state::{ChangeId, TaskId};

/// The single source of truth for every task and change.
///
/// Shared between the graph builder and the runner as
/// `Arc<parking_lot::Mutex<State>>`. The lock is held only for the duration
/// of a check-and-transition, never across a handler's execution.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct State {
    tasks: BTreeMap<TaskId, Task>,
    changes: BTreeMap<ChangeId, Change>,
    last_task_id: u64,
    last_change_id: u64,
}

impl State {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a task in status `Do` and register it in the arena.
    pub fn new_task(&mut self, kind: TaskKind, summary: impl Into<String>) -> TaskId {
        self.last_task_id += 1;
        let id = self.last_task_id.to_string();
        self.tasks
            .insert(id.clone(), Task::new(id.clone(), kind, summary.into()));
        id
    }

    /// Create an empty change.
    pub fn new_change(&mut self, kind: impl Into<String>, summary: impl Into<String>) -> ChangeId {
        self.last_change_id += 1;
        let id = self.last_change_id.to_string();
        self.changes
            .insert(id.clone(), Change::new(id.clone(), kind.into(), summary.into()));
        id
    }

    pub fn task(&self, id: &str) -> Option<&Task> {
        self.tasks.get(id)
    }

    pub fn task_mut(&mut self, id: &str) -> Option<&mut Task> {
        self.tasks.get_mut(id)
    }

    /// Every task in the arena.
    pub fn tasks(&self) -> impl Iterator<Item = &Task> {
        self.tasks.values()
    }

    pub fn change(&self, id: &str) -> Option<&Change> {
        self.changes.get(id)
    }

    pub fn change_mut(&mut self, id: &str) -> Option<&mut Change> {
        self.changes.get_mut(id)
    }

    pub fn changes(&self) -> impl Iterator<Item = &Change> {
        self.changes.values()
    }

    /// Attach a task set to a change, binding each task to it.
    pub fn add_task_set(&mut self, change: &ChangeId, ts: &TaskSet) {
        let Some(chg) = self.changes.get_mut(change) else {
            warn!(change = %change, "add_task_set: unknown change");
            return;
        };
        chg.add_task_set(ts);
        for id in ts.tasks() {
            match self.tasks.get_mut(id) {
                Some(task) => task.bind_change(change.clone()),
                None => warn!(task = %id, "task set references unknown task"),
            }
        }
    }

    /// Attach a single task to a change.
    pub fn add_task_to_change(&mut self, change: &ChangeId, task: &TaskId) {
        let Some(chg) = self.changes.get_mut(change) else {
            warn!(change = %change, "add_task_to_change: unknown change");
            return;
        };
        chg.add_task(task.clone());
        if let Some(t) = self.tasks.get_mut(task) {
            t.bind_change(change.clone());
        }
    }

    /// Record a wait edge: `task` cannot start until `dep` is `Done`.
    ///
    /// The inverse halt edge is maintained alongside; duplicate edges are
    /// ignored, insertion order is preserved.
    pub fn add_wait(&mut self, task: &TaskId, dep: &TaskId) {
        if task == dep {
            warn!(task = %task, "add_wait: task cannot wait on itself; ignoring");
            return;
        }
        let Some(t) = self.tasks.get_mut(task) else {
            warn!(task = %task, "add_wait: unknown task");
            return;
        };
        if !t.push_wait(dep) {
            return;
        }
        match self.tasks.get_mut(dep) {
            Some(d) => d.push_halt(task),
            None => warn!(task = %dep, "add_wait: unknown dependency task"),
        }
    }

    /// Whether every wait dependency of `task` is `Done`.
    pub fn wait_satisfied(&self, task: &Task) -> bool {
        for dep_id in task.wait_tasks() {
            let dep = match self.tasks.get(dep_id) {
                Some(d) => d,
                None => {
                    warn!(task = %task.id(), dep = %dep_id, "wait dependency missing from arena");
                    return false;
                }
            };
            if dep.status() != Status::Done {
                return false;
            }
        }
        true
    }

    /// Mark still-pending dependents of `root` as `Error`, transitively.
    ///
    /// Tasks already `Doing` are left to finish; terminal tasks are
    /// untouched. Returns the ids that were newly failed, in traversal
    /// order, with a note recorded in each task's log.
    pub fn mark_dependents_failed(&mut self, root: &TaskId) -> Vec<TaskId> {
        let root_kind = self.tasks.get(root).map(|t| t.kind());
        let mut stack: Vec<TaskId> = self
            .tasks
            .get(root)
            .map(|t| t.halt_tasks().to_vec())
            .unwrap_or_default();

        let mut newly_failed = Vec::new();

        while let Some(id) = stack.pop() {
            let Some(task) = self.tasks.get_mut(&id) else {
                continue;
            };
            if task.status() != Status::Do {
                continue;
            }
            task.set_status(Status::Error);
            match root_kind {
                Some(kind) => task.add_log(format!("ERROR: dependency task {kind} failed")),
                None => task.add_log("ERROR: dependency task failed".to_string()),
            }
            debug!(task = %id, "failing dependent of errored task");
            stack.extend(task.halt_tasks().to_vec());
            newly_failed.push(id);
        }

        newly_failed
    }

    /// True if a backward walk over wait edges from `task` reaches a
    /// checkpoint task currently resting in `Doing`.
    ///
    /// Used by the runner to tell "legitimately deferred until the next
    /// boot" apart from "stuck".
    pub fn checkpoint_reached_in_wait_chain(&self, task: &TaskId) -> bool {
        let mut stack: Vec<&TaskId> = self
            .tasks
            .get(task)
            .map(|t| t.wait_tasks().iter().collect())
            .unwrap_or_default();
        let mut visited: BTreeSet<&TaskId> = BTreeSet::new();

        while let Some(id) = stack.pop() {
            if !visited.insert(id) {
                continue;
            }
            let Some(dep) = self.tasks.get(id) else {
                continue;
            };
            if dep.is_checkpoint() && dep.status() == Status::Doing {
                return true;
            }
            stack.extend(dep.wait_tasks().iter());
        }

        false
    }

    /// Derived roll-up status of a change, for diagnostics.
    ///
    /// `Error` wins over everything; otherwise the change is `Done` only
    /// once every task is `Done`, `Do` while nothing has started, and
    /// `Doing` in between.
    pub fn change_status(&self, change: &ChangeId) -> Option<Status> {
        let chg = self.changes.get(change)?;
        let mut all_done = true;
        let mut all_do = true;
        for id in chg.task_ids() {
            let Some(task) = self.tasks.get(id) else {
                continue;
            };
            match task.status() {
                Status::Error => return Some(Status::Error),
                Status::Done => all_do = false,
                Status::Do => all_done = false,
                _ => {
                    all_do = false;
                    all_done = false;
                }
            }
        }
        if all_done {
            Some(Status::Done)
        } else if all_do {
            Some(Status::Do)
        } else {
            Some(Status::Doing)
        }
    }

    /// Drop a change and its tasks from the arena.
    ///
    /// Edges from surviving tasks into the removed set are scrubbed so no
    /// dangling references remain. Returns `false` if the change is
    /// unknown.
    pub fn prune_change(&mut self, change: &ChangeId) -> bool {
        let Some(chg) = self.changes.remove(change) else {
            return false;
        };
        let gone: BTreeSet<TaskId> = chg.task_ids().iter().cloned().collect();
        for id in &gone {
            self.tasks.remove(id);
        }
        for task in self.tasks.values_mut() {
            task.remove_edges_to(&gone);
        }
        debug!(change = %change, tasks = gone.len(), "pruned change");
        true
    }
}
