// src/dag/state_manager.rs

//! Per-run state transitions for tasks in a build run.

use std::collections::HashMap;

use tracing::{debug, info, warn};

use crate::dag::TaskGraph;
use crate::dag::task_info::{RunState, ScheduledTask};
use crate::engine::TaskName;

/// Manages per-run state transitions for tasks.
pub struct StateManager<'a> {
    graph: &'a TaskGraph,
    states: &'a mut HashMap<TaskName, RunState>,
    run_id: u64,
}

impl<'a> StateManager<'a> {
    pub fn new(graph: &'a TaskGraph, states: &'a mut HashMap<TaskName, RunState>, run_id: u64) -> Self {
        Self {
            graph,
            states,
            run_id,
        }
    }

    /// Collect `Pending` tasks whose prerequisites are satisfied, mark them
    /// `Running`, and return them in declaration order.
    pub fn collect_new_ready_tasks(&mut self) -> Vec<ScheduledTask> {
        let candidates: Vec<TaskName> = self
            .graph
            .tasks()
            .filter(|name| matches!(self.states.get(*name), Some(RunState::Pending)))
            .filter(|name| deps_satisfied(self.graph, &*self.states, name))
            .map(str::to_string)
            .collect();

        let mut ready = Vec::with_capacity(candidates.len());
        for name in candidates {
            let Some(action) = self.graph.action_of(&name).cloned() else {
                warn!(task = %name, "task in run is missing from the graph");
                continue;
            };

            info!(task = %name, run_id = self.run_id, "scheduling task");
            debug!(task = %name, run_id = self.run_id, "prerequisites satisfied; marking Running");

            self.states.insert(name.clone(), RunState::Running);
            ready.push(ScheduledTask {
                name,
                action,
                run_id: self.run_id,
            });
        }

        ready
    }

    /// Mark every still-`Pending` task as `Skipped` and return their names in
    /// declaration order.
    pub fn skip_pending(&mut self) -> Vec<TaskName> {
        let pending: Vec<TaskName> = self
            .graph
            .tasks()
            .filter(|name| matches!(self.states.get(*name), Some(RunState::Pending)))
            .map(str::to_string)
            .collect();

        for name in &pending {
            debug!(task = %name, run_id = self.run_id, "skipping task after failure");
            self.states.insert(name.clone(), RunState::Skipped);
        }
        pending
    }

    /// Check if all participating tasks are in a terminal state.
    pub fn all_tasks_terminal(&self) -> bool {
        self.states.values().all(|s| s.is_terminal())
    }
}

/// Whether every prerequisite of `name` is satisfied for this run.
///
/// Prerequisites participating in the run must be `DoneSuccess`.
/// Prerequisites outside the run (a run restricted to a task and its
/// dependents) are taken as already built.
pub fn deps_satisfied(graph: &TaskGraph, states: &HashMap<TaskName, RunState>, name: &str) -> bool {
    graph
        .prerequisites_of(name)
        .iter()
        .all(|prereq| match states.get(prereq) {
            Some(RunState::DoneSuccess) | None => true,
            Some(_) => false,
        })
}
