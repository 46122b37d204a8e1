// tests/property.rs

//! Property tests over arbitrary package lists: the builder's ordering
//! invariants must hold for every graph it can produce.

use proptest::prelude::*;

use seedrun::graph::{build_seed_change, ensure_acyclic, BuildOptions, SeedPackage};
use seedrun::state::{State, TaskKind};

fn packages_strategy() -> impl Strategy<Value = Vec<SeedPackage>> {
    proptest::collection::vec((0u8..3, any::<bool>(), any::<bool>()), 1..8).prop_map(|specs| {
        specs
            .into_iter()
            .enumerate()
            .map(|(i, (hooks, services, gadget_assets))| SeedPackage {
                instance_name: format!("pkg{i}"),
                hooks: (0..hooks).map(|h| format!("hook{h}")).collect(),
                services,
                gadget_assets,
            })
            .collect()
    })
}

fn mark_preseeded_in_wait_chain(state: &State, id: &str) -> bool {
    state.task(id).unwrap().wait_tasks().iter().any(|wt| {
        state.task(wt).unwrap().kind() == TaskKind::MarkPreseeded
            || mark_preseeded_in_wait_chain(state, wt)
    })
}

proptest! {
    #[test]
    fn built_graphs_satisfy_the_ordering_invariants(
        packages in packages_strategy(),
        preseed in any::<bool>(),
    ) {
        let mut state = State::new();
        let (change, tasksets) =
            build_seed_change(&mut state, &packages, &BuildOptions { preseed }).unwrap();

        prop_assert!(ensure_acyclic(&state, &change).is_ok());
        prop_assert_eq!(tasksets.len(), packages.len() + 1);

        // fixed chain of 9 steps per package, plus the optional ones
        let per_package: usize = packages
            .iter()
            .map(|p| 9 + usize::from(p.gadget_assets) + p.hooks.len() + usize::from(p.services))
            .sum();
        let trailing = 2 + usize::from(preseed);
        let all = state.change(&change).unwrap().task_ids().to_vec();
        prop_assert_eq!(all.len(), per_package + trailing);

        let of_kind = |kind: TaskKind| -> Vec<&String> {
            all.iter()
                .filter(|id| state.task(id).unwrap().kind() == kind)
                .collect()
        };

        // exactly one mark-seeded, and nothing waits on it
        let seeded = of_kind(TaskKind::MarkSeeded);
        prop_assert_eq!(seeded.len(), 1);
        prop_assert!(state.task(seeded[0]).unwrap().halt_tasks().is_empty());

        let preseeded = of_kind(TaskKind::MarkPreseeded);
        prop_assert_eq!(preseeded.len(), usize::from(preseed));

        if preseed {
            // one wait edge into setup-aliases per package
            let checkpoint = state.task(preseeded[0]).unwrap();
            prop_assert!(checkpoint.is_checkpoint());
            let aliases_edges = checkpoint
                .wait_tasks()
                .iter()
                .filter(|id| state.task(id).unwrap().kind() == TaskKind::SetupAliases)
                .count();
            prop_assert_eq!(aliases_edges, packages.len());

            // hooks and service starts are gated behind the checkpoint
            for id in of_kind(TaskKind::RunHook)
                .into_iter()
                .chain(of_kind(TaskKind::StartSnapServices))
            {
                prop_assert!(mark_preseeded_in_wait_chain(&state, id));
            }
        }

        // package chains are serialized through setup-aliases
        let first = state.task(tasksets[0].first().unwrap()).unwrap();
        prop_assert!(first.wait_tasks().is_empty());
        for ts in &tasksets[1..packages.len()] {
            let first = state.task(ts.first().unwrap()).unwrap();
            prop_assert_eq!(first.kind(), TaskKind::Prerequisites);
            prop_assert_eq!(first.wait_tasks().len(), 1);
            let dep = state.task(&first.wait_tasks()[0]).unwrap();
            prop_assert_eq!(dep.kind(), TaskKind::SetupAliases);
        }
    }
}
