// src/graph/validate.rs

use petgraph::algo::toposort;
use petgraph::graphmap::DiGraphMap;

use crate::errors::{Result, SeedrunError};
use crate::state::{ChangeId, State};

/// Verify that the wait edges of a built change form a DAG.
///
/// Edge direction: dep -> task, i.e. for "task waits for dep" we add the
/// edge dep -> task. A topological sort fails iff there is a cycle; a cycle
/// is a contract violation of the builder, fatal at build time.
pub fn ensure_acyclic(state: &State, change: &ChangeId) -> Result<()> {
    let Some(chg) = state.change(change) else {
        return Err(SeedrunError::ChangeNotFound(change.clone()));
    };

    let mut graph: DiGraphMap<&str, ()> = DiGraphMap::new();

    for id in chg.task_ids() {
        graph.add_node(id.as_str());
    }

    for id in chg.task_ids() {
        let Some(task) = state.task(id) else {
            return Err(SeedrunError::TaskNotFound(id.clone()));
        };
        for dep in task.wait_tasks() {
            graph.add_edge(dep.as_str(), id.as_str(), ());
        }
    }

    match toposort(&graph, None) {
        Ok(_order) => Ok(()),
        Err(cycle) => {
            let node = cycle.node_id();
            Err(SeedrunError::MalformedGraph(format!(
                "cycle detected in wait edges involving task '{node}'"
            )))
        }
    }
}
