// src/dag/scheduler.rs

//! Entry point for creating build runs over a shared graph.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::dag::TaskGraph;
use crate::dag::build_run::BuildRun;
use crate::errors::{AssetdagError, Result};

/// Owns the immutable graph and hands out [`BuildRun`]s with increasing ids.
#[derive(Debug)]
pub struct Scheduler {
    graph: Arc<TaskGraph>,
    run_counter: AtomicU64,
}

impl Scheduler {
    pub fn new(graph: TaskGraph) -> Self {
        Self::from_arc(Arc::new(graph))
    }

    pub fn from_arc(graph: Arc<TaskGraph>) -> Self {
        Self {
            graph,
            run_counter: AtomicU64::new(0),
        }
    }

    pub fn graph(&self) -> &Arc<TaskGraph> {
        &self.graph
    }

    /// Run `target` and all of its transitive prerequisites.
    pub fn begin(&self, target: &str) -> Result<BuildRun> {
        self.ensure_known(target)?;
        let participants = self.graph.prerequisite_closure(target);
        Ok(BuildRun::new(
            Arc::clone(&self.graph),
            self.next_run_id(),
            target,
            participants,
        ))
    }

    /// Run `root` and all of its transitive dependents. Prerequisites outside
    /// that set are treated as already built.
    pub fn begin_with_dependents(&self, root: &str) -> Result<BuildRun> {
        self.ensure_known(root)?;
        let participants = self.graph.dependent_closure(root);
        Ok(BuildRun::new(
            Arc::clone(&self.graph),
            self.next_run_id(),
            root,
            participants,
        ))
    }

    fn ensure_known(&self, name: &str) -> Result<()> {
        if self.graph.contains(name) {
            Ok(())
        } else {
            Err(AssetdagError::TaskNotFound(name.to_string()))
        }
    }

    fn next_run_id(&self) -> u64 {
        self.run_counter.fetch_add(1, Ordering::Relaxed) + 1
    }
}
