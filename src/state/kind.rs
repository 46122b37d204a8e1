// src/state/kind.rs

//! The closed set of task kinds the engine knows how to schedule.
//!
//! Handler dispatch is an explicit lookup table keyed by this enum (see
//! `exec::HandlerRegistry`); the engine never matches on kind strings.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Identifier for the action behind a task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TaskKind {
    Prerequisites,
    PrepareSnap,
    MountSnap,
    UpdateGadgetAssets,
    LinkSnap,
    SetupProfiles,
    CopySnapData,
    SetAutoAliases,
    SetupAliases,
    AutoConnect,
    RunHook,
    StartSnapServices,
    GadgetConnect,
    MarkPreseeded,
    MarkSeeded,
}

impl TaskKind {
    /// Every kind, in the order a package chain produces them.
    pub const ALL: [TaskKind; 15] = [
        TaskKind::Prerequisites,
        TaskKind::PrepareSnap,
        TaskKind::MountSnap,
        TaskKind::UpdateGadgetAssets,
        TaskKind::LinkSnap,
        TaskKind::SetupProfiles,
        TaskKind::CopySnapData,
        TaskKind::SetAutoAliases,
        TaskKind::SetupAliases,
        TaskKind::AutoConnect,
        TaskKind::RunHook,
        TaskKind::StartSnapServices,
        TaskKind::GadgetConnect,
        TaskKind::MarkPreseeded,
        TaskKind::MarkSeeded,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            TaskKind::Prerequisites => "prerequisites",
            TaskKind::PrepareSnap => "prepare-snap",
            TaskKind::MountSnap => "mount-snap",
            TaskKind::UpdateGadgetAssets => "update-gadget-assets",
            TaskKind::LinkSnap => "link-snap",
            TaskKind::SetupProfiles => "setup-profiles",
            TaskKind::CopySnapData => "copy-snap-data",
            TaskKind::SetAutoAliases => "set-auto-aliases",
            TaskKind::SetupAliases => "setup-aliases",
            TaskKind::AutoConnect => "auto-connect",
            TaskKind::RunHook => "run-hook",
            TaskKind::StartSnapServices => "start-snap-services",
            TaskKind::GadgetConnect => "gadget-connect",
            TaskKind::MarkPreseeded => "mark-preseeded",
            TaskKind::MarkSeeded => "mark-seeded",
        }
    }
}

impl fmt::Display for TaskKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TaskKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "prerequisites" => Ok(TaskKind::Prerequisites),
            "prepare-snap" => Ok(TaskKind::PrepareSnap),
            "mount-snap" => Ok(TaskKind::MountSnap),
            "update-gadget-assets" => Ok(TaskKind::UpdateGadgetAssets),
            "link-snap" => Ok(TaskKind::LinkSnap),
            "setup-profiles" => Ok(TaskKind::SetupProfiles),
            "copy-snap-data" => Ok(TaskKind::CopySnapData),
            "set-auto-aliases" => Ok(TaskKind::SetAutoAliases),
            "setup-aliases" => Ok(TaskKind::SetupAliases),
            "auto-connect" => Ok(TaskKind::AutoConnect),
            "run-hook" => Ok(TaskKind::RunHook),
            "start-snap-services" => Ok(TaskKind::StartSnapServices),
            "gadget-connect" => Ok(TaskKind::GadgetConnect),
            "mark-preseeded" => Ok(TaskKind::MarkPreseeded),
            "mark-seeded" => Ok(TaskKind::MarkSeeded),
            other => Err(format!("unknown task kind: {other}")),
        }
    }
}
