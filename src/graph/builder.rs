// src/graph/builder.rs

//! Builds the seeding change.
//!
//! Each package gets one task set with a fixed internal chain; task sets are
//! serialized through the previous package's `setup-aliases` task so alias
//! setup never races across packages. A trailing task set closes the change
//! with `gadget-connect`, the preseed checkpoint (preseed mode only) and
//! `mark-seeded`.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::errors::Result;
use crate::graph::validate::ensure_acyclic;
use crate::state::{ChangeId, State, TaskId, TaskKind, TaskSet};

/// One package to seed, in seed order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeedPackage {
    pub instance_name: String,
    /// Lifecycle hooks to run on first boot (e.g. "install", "configure").
    #[serde(default)]
    pub hooks: Vec<String>,
    /// Whether the package ships services to start once seeding finishes.
    #[serde(default)]
    pub services: bool,
    /// Whether the package carries bootloader/gadget assets to update
    /// before it is linked.
    #[serde(default)]
    pub gadget_assets: bool,
}

impl SeedPackage {
    pub fn new(instance_name: impl Into<String>) -> Self {
        Self {
            instance_name: instance_name.into(),
            hooks: Vec::new(),
            services: false,
            gadget_assets: false,
        }
    }
}

/// Options for building a seeding change.
#[derive(Debug, Clone, Copy, Default)]
pub struct BuildOptions {
    /// Prepare package state now; finalization happens on a later real
    /// boot, with the change halting at the `mark-preseeded` checkpoint.
    pub preseed: bool,
}

/// Typed form of the per-package task payload.
///
/// This is serialized into the task's opaque params; only handlers and the
/// builder know its shape, the engine does not.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskParams {
    #[serde(rename = "instance-name")]
    pub instance_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hook: Option<String>,
}

/// Build the change that seeds `packages`, wiring every ordering rule of
/// first-boot installation. Returns the change id plus the task sets in
/// build order (one per package, then the trailing set).
pub fn build_seed_change(
    state: &mut State,
    packages: &[SeedPackage],
    options: &BuildOptions,
) -> Result<(ChangeId, Vec<TaskSet>)> {
    let change = state.new_change("seed", "Initialize system state");

    let mut tasksets: Vec<TaskSet> = Vec::with_capacity(packages.len() + 1);
    // setup-aliases of every package, in package order.
    let mut aliases_tasks: Vec<TaskId> = Vec::with_capacity(packages.len());
    // run-hook and start-snap-services tasks across all packages; in
    // preseed mode these are gated behind the checkpoint.
    let mut deferred_tasks: Vec<TaskId> = Vec::new();
    let mut prev_aliases: Option<TaskId> = None;
    let mut last_chain_task: Option<TaskId> = None;

    for pkg in packages {
        let mut ts = TaskSet::new();
        let mut prev: Option<TaskId> = None;

        let prerequisites =
            add_package_task(state, &mut ts, &mut prev, pkg, TaskKind::Prerequisites, None)?;
        if let Some(aliases) = &prev_aliases {
            // Serialize alias setup across packages: the first task of this
            // package waits on setup-aliases of the previous one.
            state.add_wait(&prerequisites, aliases);
        }

        add_package_task(state, &mut ts, &mut prev, pkg, TaskKind::PrepareSnap, None)?;
        add_package_task(state, &mut ts, &mut prev, pkg, TaskKind::MountSnap, None)?;
        if pkg.gadget_assets {
            add_package_task(state, &mut ts, &mut prev, pkg, TaskKind::UpdateGadgetAssets, None)?;
        }
        add_package_task(state, &mut ts, &mut prev, pkg, TaskKind::LinkSnap, None)?;
        add_package_task(state, &mut ts, &mut prev, pkg, TaskKind::SetupProfiles, None)?;
        add_package_task(state, &mut ts, &mut prev, pkg, TaskKind::CopySnapData, None)?;
        add_package_task(state, &mut ts, &mut prev, pkg, TaskKind::SetAutoAliases, None)?;
        let aliases =
            add_package_task(state, &mut ts, &mut prev, pkg, TaskKind::SetupAliases, None)?;
        add_package_task(state, &mut ts, &mut prev, pkg, TaskKind::AutoConnect, None)?;

        for hook in &pkg.hooks {
            let task = add_package_task(
                state,
                &mut ts,
                &mut prev,
                pkg,
                TaskKind::RunHook,
                Some(hook.as_str()),
            )?;
            deferred_tasks.push(task);
        }
        if pkg.services {
            let task =
                add_package_task(state, &mut ts, &mut prev, pkg, TaskKind::StartSnapServices, None)?;
            deferred_tasks.push(task);
        }

        prev_aliases = Some(aliases.clone());
        aliases_tasks.push(aliases);
        last_chain_task = prev.clone();
        state.add_task_set(&change, &ts);
        tasksets.push(ts);
    }

    // Trailing task set: gadget-connect, [mark-preseeded], mark-seeded.
    let mut trailing = TaskSet::new();

    let gadget_connect = state.new_task(TaskKind::GadgetConnect, "Connect plugs and slots of the gadget");
    if let Some(aliases) = &prev_aliases {
        state.add_wait(&gadget_connect, aliases);
    }
    trailing.add(gadget_connect.clone());

    let mark_preseeded = if options.preseed {
        let id = state.new_task(TaskKind::MarkPreseeded, "Mark system pre-seeded");
        if let Some(task) = state.task_mut(&id) {
            task.set_checkpoint(true);
        }
        // The checkpoint sits after alias setup of every package...
        for aliases in &aliases_tasks {
            state.add_wait(&id, aliases);
        }
        // ...and gates hooks and service starts until the next boot.
        for deferred in &deferred_tasks {
            state.add_wait(deferred, &id);
        }
        trailing.add(id.clone());
        Some(id)
    } else {
        None
    };

    let mark_seeded = state.new_task(TaskKind::MarkSeeded, "Mark system seeded");
    state.add_wait(&mark_seeded, &gadget_connect);
    match &mark_preseeded {
        Some(checkpoint) => state.add_wait(&mark_seeded, checkpoint),
        None => {
            if let Some(last) = &last_chain_task {
                state.add_wait(&mark_seeded, last);
            }
        }
    }
    trailing.add(mark_seeded);

    state.add_task_set(&change, &trailing);
    tasksets.push(trailing);

    ensure_acyclic(state, &change)?;

    debug!(
        change = %change,
        packages = packages.len(),
        preseed = options.preseed,
        "seed change built"
    );

    Ok((change, tasksets))
}

/// Append one task to a package's chain: creates it, attaches the package
/// payload, and wires it after the previous chain task.
fn add_package_task(
    state: &mut State,
    ts: &mut TaskSet,
    prev: &mut Option<TaskId>,
    pkg: &SeedPackage,
    kind: TaskKind,
    hook: Option<&str>,
) -> Result<TaskId> {
    let id = state.new_task(kind, package_summary(kind, &pkg.instance_name, hook));

    let params = TaskParams {
        instance_name: pkg.instance_name.clone(),
        hook: hook.map(String::from),
    };
    if let Some(task) = state.task_mut(&id) {
        task.set_params(serde_json::to_value(&params)?);
    }

    if let Some(prev_id) = prev {
        state.add_wait(&id, prev_id);
    }
    ts.add(id.clone());
    *prev = Some(id.clone());
    Ok(id)
}

fn package_summary(kind: TaskKind, name: &str, hook: Option<&str>) -> String {
    match kind {
        TaskKind::Prerequisites => format!("Ensure prerequisites for \"{name}\" are available"),
        TaskKind::PrepareSnap => format!("Prepare package \"{name}\""),
        TaskKind::MountSnap => format!("Mount package \"{name}\""),
        TaskKind::UpdateGadgetAssets => format!("Update assets from gadget \"{name}\""),
        TaskKind::LinkSnap => format!("Make package \"{name}\" available to the system"),
        TaskKind::SetupProfiles => format!("Setup package \"{name}\" security profiles"),
        TaskKind::CopySnapData => format!("Copy package \"{name}\" data"),
        TaskKind::SetAutoAliases => format!("Set automatic aliases for package \"{name}\""),
        TaskKind::SetupAliases => format!("Setup package \"{name}\" aliases"),
        TaskKind::AutoConnect => {
            format!("Automatically connect eligible plugs and slots of package \"{name}\"")
        }
        TaskKind::RunHook => match hook {
            Some(h) => format!("Run hook \"{h}\" of package \"{name}\""),
            None => format!("Run hook of package \"{name}\""),
        },
        TaskKind::StartSnapServices => format!("Start package \"{name}\" services"),
        TaskKind::GadgetConnect => "Connect plugs and slots of the gadget".to_string(),
        TaskKind::MarkPreseeded => "Mark system pre-seeded".to_string(),
        TaskKind::MarkSeeded => "Mark system seeded".to_string(),
    }
}
