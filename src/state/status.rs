// src/state/status.rs

//! Task status state machine.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Status of a single task.
///
/// Normal lifecycle: `Do` -> `Doing` -> `Done`, with `Error` reachable from
/// either non-terminal status (handler failure, or a failed dependency).
/// A checkpoint task legitimately ends a preseed run while still `Doing`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Status {
    /// Waiting for dependencies, or for the runner to schedule it.
    Do,
    /// Currently executing (or, for a checkpoint task, resting until a
    /// later boot finalizes it).
    Doing,
    /// Handler completed successfully; satisfies wait edges pointing here.
    Done,
    /// Handler failed, or a dependency failed.
    Error,
    /// Reserved for rollback of already-done tasks; never produced by this
    /// core.
    Undo,
    /// Reserved for tasks gated on an external event; never produced by this
    /// core.
    Wait,
}

impl Status {
    /// Whether this status ends the task for good (`Done` or `Error`).
    pub fn is_terminal(self) -> bool {
        matches!(self, Status::Done | Status::Error)
    }

    /// Whether the task is currently being worked on.
    pub fn is_active(self) -> bool {
        matches!(self, Status::Doing)
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Status::Do => write!(f, "do"),
            Status::Doing => write!(f, "doing"),
            Status::Done => write!(f, "done"),
            Status::Error => write!(f, "error"),
            Status::Undo => write!(f, "undo"),
            Status::Wait => write!(f, "wait"),
        }
    }
}

impl FromStr for Status {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "do" => Ok(Status::Do),
            "doing" => Ok(Status::Doing),
            "done" => Ok(Status::Done),
            "error" => Ok(Status::Error),
            "undo" => Ok(Status::Undo),
            "wait" => Ok(Status::Wait),
            other => Err(format!("unknown task status: {other}")),
        }
    }
}
