// tests/graph_order.rs

//! Shape of the graph the builder produces: trailing task set, checkpoint
//! wiring, per-package serialization and build-time cycle rejection.

use seedrun::errors::SeedrunError;
use seedrun::graph::{build_seed_change, ensure_acyclic, BuildOptions};
use seedrun::state::{State, TaskId, TaskKind, TaskSet};
use seedrun_test_utils::builders::{essential_packages, PackageBuilder};

fn tasks_of_kind(state: &State, change: &str, kind: TaskKind) -> Vec<TaskId> {
    state
        .change(change)
        .unwrap()
        .task_ids()
        .iter()
        .filter(|id| state.task(id).unwrap().kind() == kind)
        .cloned()
        .collect()
}

fn mark_preseeded_in_wait_chain(state: &State, id: &str) -> bool {
    state.task(id).unwrap().wait_tasks().iter().any(|wt| {
        state.task(wt).unwrap().kind() == TaskKind::MarkPreseeded
            || mark_preseeded_in_wait_chain(state, wt)
    })
}

#[test]
fn preseed_trailing_task_set_is_connect_preseeded_seeded() {
    let mut state = State::new();
    let (_change, tasksets) = build_seed_change(
        &mut state,
        &essential_packages(),
        &BuildOptions { preseed: true },
    )
    .unwrap();

    let trailing = tasksets.last().unwrap();
    assert_eq!(trailing.len(), 3);

    let kinds: Vec<TaskKind> = trailing
        .tasks()
        .iter()
        .map(|id| state.task(id).unwrap().kind())
        .collect();
    assert_eq!(
        kinds,
        vec![
            TaskKind::GadgetConnect,
            TaskKind::MarkPreseeded,
            TaskKind::MarkSeeded
        ]
    );

    // mark-seeded waits for gadget-connect and mark-preseeded, exactly.
    let gadget_connect = trailing.tasks()[0].clone();
    let mark_preseeded = trailing.tasks()[1].clone();
    let mark_seeded = state.task(&trailing.tasks()[2]).unwrap();
    assert_eq!(
        mark_seeded.wait_tasks().to_vec(),
        vec![gadget_connect, mark_preseeded]
    );
}

#[test]
fn mark_tasks_are_unique_and_seeded_is_a_pure_sink() {
    let mut state = State::new();
    let (change, _tasksets) = build_seed_change(
        &mut state,
        &essential_packages(),
        &BuildOptions { preseed: true },
    )
    .unwrap();

    let seeded = tasks_of_kind(&state, &change, TaskKind::MarkSeeded);
    let preseeded = tasks_of_kind(&state, &change, TaskKind::MarkPreseeded);
    assert_eq!(seeded.len(), 1);
    assert_eq!(preseeded.len(), 1);

    // nothing waits for mark-seeded
    let mark_seeded = state.task(&seeded[0]).unwrap();
    assert!(mark_seeded.halt_tasks().is_empty());
    assert_eq!(mark_seeded.change(), Some(&change));

    let chg = state.change(&change).unwrap();
    assert_eq!(chg.id(), &change);
    assert_eq!(chg.kind(), "seed");
    assert_eq!(chg.summary(), "Initialize system state");
}

#[test]
fn checkpoint_waits_on_setup_aliases_of_every_package() {
    let packages = essential_packages();
    let mut state = State::new();
    let (change, _tasksets) =
        build_seed_change(&mut state, &packages, &BuildOptions { preseed: true }).unwrap();

    let preseeded = tasks_of_kind(&state, &change, TaskKind::MarkPreseeded);
    let checkpoint = state.task(&preseeded[0]).unwrap();
    assert!(checkpoint.is_checkpoint());

    let aliases_waits = checkpoint
        .wait_tasks()
        .iter()
        .filter(|id| state.task(id).unwrap().kind() == TaskKind::SetupAliases)
        .count();
    assert_eq!(aliases_waits, packages.len());
}

#[test]
fn hooks_and_service_starts_sit_behind_the_checkpoint() {
    let mut state = State::new();
    let (change, _tasksets) = build_seed_change(
        &mut state,
        &essential_packages(),
        &BuildOptions { preseed: true },
    )
    .unwrap();

    let hooks = tasks_of_kind(&state, &change, TaskKind::RunHook);
    let services = tasks_of_kind(&state, &change, TaskKind::StartSnapServices);
    assert!(!hooks.is_empty());
    assert!(!services.is_empty());

    for id in hooks.iter().chain(services.iter()) {
        assert!(
            mark_preseeded_in_wait_chain(&state, id),
            "task {id} can run before the preseed checkpoint"
        );
    }
}

#[test]
fn package_chains_serialize_through_setup_aliases() {
    let packages = essential_packages();
    let mut state = State::new();
    let (_change, tasksets) =
        build_seed_change(&mut state, &packages, &BuildOptions { preseed: true }).unwrap();

    assert_eq!(tasksets.len(), packages.len() + 1);

    let mut prev_aliases: Option<TaskId> = None;
    for (i, ts) in tasksets[..packages.len()].iter().enumerate() {
        let first = state.task(ts.first().unwrap()).unwrap();
        assert_eq!(first.kind(), TaskKind::Prerequisites);
        assert_eq!(
            first.params()["instance-name"],
            packages[i].instance_name.as_str()
        );

        if i == 0 {
            assert!(first.wait_tasks().is_empty());
        } else {
            // prerequisites waits for setup-aliases of the previous package
            assert_eq!(
                first.wait_tasks().to_vec(),
                vec![prev_aliases.clone().unwrap()]
            );
        }

        let aliases = ts
            .tasks()
            .iter()
            .find(|id| state.task(id).unwrap().kind() == TaskKind::SetupAliases)
            .unwrap();
        prev_aliases = Some(aliases.clone());
    }
}

#[test]
fn normal_mode_omits_the_checkpoint() {
    let mut state = State::new();
    let (change, tasksets) = build_seed_change(
        &mut state,
        &essential_packages(),
        &BuildOptions { preseed: false },
    )
    .unwrap();

    let trailing = tasksets.last().unwrap();
    assert_eq!(trailing.len(), 2);
    let kinds: Vec<TaskKind> = trailing
        .tasks()
        .iter()
        .map(|id| state.task(id).unwrap().kind())
        .collect();
    assert_eq!(kinds, vec![TaskKind::GadgetConnect, TaskKind::MarkSeeded]);

    assert!(tasks_of_kind(&state, &change, TaskKind::MarkPreseeded).is_empty());

    // mark-seeded waits for gadget-connect plus the end of the last chain
    let mark_seeded = state.task(&trailing.tasks()[1]).unwrap();
    assert_eq!(mark_seeded.wait_tasks().len(), 2);
    assert_eq!(&mark_seeded.wait_tasks()[0], &trailing.tasks()[0]);
    let chain_end = state.task(&mark_seeded.wait_tasks()[1]).unwrap();
    assert_eq!(chain_end.kind(), TaskKind::StartSnapServices);
}

#[test]
fn empty_package_list_still_builds_the_trailing_set() {
    let mut state = State::new();
    let (_change, tasksets) =
        build_seed_change(&mut state, &[], &BuildOptions { preseed: true }).unwrap();
    assert_eq!(tasksets.len(), 1);
    let trailing = &tasksets[0];
    assert_eq!(trailing.len(), 3);
    assert!(state
        .task(&trailing.tasks()[0])
        .unwrap()
        .wait_tasks()
        .is_empty());
    // the checkpoint has no aliases to wait on
    assert!(state
        .task(&trailing.tasks()[1])
        .unwrap()
        .wait_tasks()
        .is_empty());

    let mut state = State::new();
    let (_change, tasksets) =
        build_seed_change(&mut state, &[], &BuildOptions { preseed: false }).unwrap();
    assert_eq!(tasksets[0].len(), 2);
    let mark_seeded = state.task(&tasksets[0].tasks()[1]).unwrap();
    assert_eq!(
        mark_seeded.wait_tasks().to_vec(),
        vec![tasksets[0].tasks()[0].clone()]
    );
}

#[test]
fn optional_steps_only_appear_when_requested() {
    let packages = vec![
        PackageBuilder::new("plain").build(),
        PackageBuilder::new("gadget").gadget_assets().hook("configure").build(),
    ];
    let mut state = State::new();
    let (change, _tasksets) =
        build_seed_change(&mut state, &packages, &BuildOptions { preseed: false }).unwrap();

    let gadget_updates = tasks_of_kind(&state, &change, TaskKind::UpdateGadgetAssets);
    assert_eq!(gadget_updates.len(), 1);
    let update = state.task(&gadget_updates[0]).unwrap();
    assert_eq!(update.params()["instance-name"], "gadget");
    assert_eq!(update.summary(), "Update assets from gadget \"gadget\"");

    let hooks = tasks_of_kind(&state, &change, TaskKind::RunHook);
    assert_eq!(hooks.len(), 1);
    assert_eq!(state.task(&hooks[0]).unwrap().params()["hook"], "configure");

    assert!(tasks_of_kind(&state, &change, TaskKind::StartSnapServices).is_empty());
}

#[test]
fn cycles_are_rejected_at_build_time() {
    let mut state = State::new();
    let change = state.new_change("seed", "cycle");
    let a = state.new_task(TaskKind::Prerequisites, "a");
    let b = state.new_task(TaskKind::PrepareSnap, "b");
    state.add_wait(&a, &b);
    state.add_wait(&b, &a);

    let mut ts = TaskSet::new();
    ts.add(a.clone());
    ts.add(b.clone());
    state.add_task_set(&change, &ts);

    let err = ensure_acyclic(&state, &change).unwrap_err();
    assert!(matches!(err, SeedrunError::MalformedGraph(_)));
}
