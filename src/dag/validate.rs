// src/dag/validate.rs

use std::collections::HashSet;

use petgraph::algo::toposort;
use petgraph::graphmap::DiGraphMap;

use crate::dag::graph::TaskDecl;
use crate::engine::TaskName;
use crate::errors::{AssetdagError, Result};

/// Validate a list of task declarations.
///
/// This checks:
/// - task names are non-empty and unique
/// - every prerequisite refers to a declared task
/// - no task lists itself as a prerequisite
/// - the prerequisite relation has no cycles
pub fn validate_decls(decls: &[TaskDecl]) -> Result<()> {
    validate_names(decls)?;
    validate_prerequisites(decls)?;
    let order: Vec<TaskName> = decls.iter().map(|d| d.name.clone()).collect();
    topological_order(&order, |name| {
        decls
            .iter()
            .find(|d| d.name == name)
            .map(|d| d.prerequisites.as_slice())
            .unwrap_or(&[])
    })?;
    Ok(())
}

fn validate_names(decls: &[TaskDecl]) -> Result<()> {
    let mut seen = HashSet::new();
    for decl in decls {
        if decl.name.trim().is_empty() {
            return Err(AssetdagError::ConfigError(
                "task names must not be empty".into(),
            ));
        }
        if !seen.insert(decl.name.as_str()) {
            return Err(AssetdagError::ConfigError(format!(
                "task '{}' is declared more than once",
                decl.name
            )));
        }
    }
    Ok(())
}

fn validate_prerequisites(decls: &[TaskDecl]) -> Result<()> {
    let names: HashSet<&str> = decls.iter().map(|d| d.name.as_str()).collect();
    for decl in decls {
        for prereq in &decl.prerequisites {
            if prereq == &decl.name {
                return Err(AssetdagError::ConfigError(format!(
                    "task '{}' cannot be its own prerequisite",
                    decl.name
                )));
            }
            if !names.contains(prereq.as_str()) {
                return Err(AssetdagError::ConfigError(format!(
                    "task '{}' has unknown prerequisite '{}'",
                    decl.name, prereq
                )));
            }
        }
    }
    Ok(())
}

/// Topologically sort `names`, prerequisites first.
///
/// Edge direction: prerequisite -> task, so for `B` after `A` we add `A -> B`.
pub(crate) fn topological_order<'a>(
    names: &'a [TaskName],
    prerequisites_of: impl Fn(&str) -> &'a [TaskName],
) -> Result<Vec<TaskName>> {
    let mut graph: DiGraphMap<&str, ()> = DiGraphMap::new();

    for name in names {
        graph.add_node(name.as_str());
    }
    for name in names {
        for prereq in prerequisites_of(name) {
            graph.add_edge(prereq.as_str(), name.as_str(), ());
        }
    }

    match toposort(&graph, None) {
        Ok(order) => Ok(order.into_iter().map(str::to_string).collect()),
        Err(cycle) => Err(AssetdagError::DagCycle(format!(
            "cycle detected in task graph involving task '{}'",
            cycle.node_id()
        ))),
    }
}
