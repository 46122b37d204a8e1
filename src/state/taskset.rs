// src/state/taskset.rs

//! Ordered groups of tasks forming one logical sub-goal.

use serde::{Deserialize, Serialize};

use crate::state::TaskId;

/// An ordered sequence of task references, e.g. "install package X".
///
/// The first and last tasks are the hooks used to chain task sets together
/// when the graph builder serializes sub-goals.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TaskSet {
    tasks: Vec<TaskId>,
}

impl TaskSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_tasks(tasks: Vec<TaskId>) -> Self {
        Self { tasks }
    }

    pub fn add(&mut self, id: TaskId) {
        self.tasks.push(id);
    }

    pub fn tasks(&self) -> &[TaskId] {
        &self.tasks
    }

    pub fn first(&self) -> Option<&TaskId> {
        self.tasks.first()
    }

    pub fn last(&self) -> Option<&TaskId> {
        self.tasks.last()
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }
}
