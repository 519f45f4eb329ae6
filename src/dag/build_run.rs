// src/dag/build_run.rs

//! One execution of the task graph.
//!
//! A [`BuildRun`] records which tasks participate, their per-run state, and
//! the outcome of each action. It guarantees at-most-once execution: a task
//! is dispatched only from `Pending`, and completions for tasks that are not
//! `Running` are ignored.
//!
//! Failure policy is fail-fast: the first failed action marks every task
//! that has not started yet as `Skipped`. Tasks already running finish and
//! their results are recorded, but nothing new is dispatched.

use std::collections::{HashMap, HashSet};
use std::path::PathBuf;
use std::sync::Arc;

use tracing::{error, info, warn};

use crate::dag::TaskGraph;
use crate::dag::scheduler_step::SchedulerStep;
use crate::dag::state_manager::{StateManager, deps_satisfied};
use crate::dag::task_info::{RunState, TaskRunState};
use crate::engine::{TaskName, TaskOutcome};
use crate::errors::{AssetdagError, Result};

/// The first action failure of a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskFailure {
    pub task: TaskName,
    pub message: String,
}

/// Summary of a finished (or abandoned) run.
#[derive(Debug, Clone, Default)]
pub struct BuildReport {
    pub run_id: u64,
    pub target: TaskName,
    /// Successfully completed tasks, in completion order.
    pub completed: Vec<TaskName>,
    /// Tasks that never started because of a failure.
    pub skipped: Vec<TaskName>,
    /// Every path written by the run's actions.
    pub outputs: Vec<PathBuf>,
    pub failure: Option<TaskFailure>,
}

impl BuildReport {
    pub fn is_success(&self) -> bool {
        self.failure.is_none()
    }

    /// Turn a failed report into [`AssetdagError::TaskFailed`].
    pub fn into_result(self) -> Result<BuildReport> {
        match self.failure {
            Some(TaskFailure { task, message }) => Err(AssetdagError::TaskFailed { task, message }),
            None => Ok(self),
        }
    }
}

#[derive(Debug)]
pub struct BuildRun {
    graph: Arc<TaskGraph>,
    run_id: u64,
    target: TaskName,
    states: HashMap<TaskName, RunState>,
    completed: Vec<TaskName>,
    outputs: Vec<PathBuf>,
    failure: Option<TaskFailure>,
    finished: bool,
}

impl BuildRun {
    /// Create a run over `participants`, all `Pending`.
    pub(crate) fn new(
        graph: Arc<TaskGraph>,
        run_id: u64,
        target: impl Into<TaskName>,
        participants: HashSet<TaskName>,
    ) -> Self {
        let states = participants
            .into_iter()
            .map(|name| (name, RunState::Pending))
            .collect();
        Self {
            graph,
            run_id,
            target: target.into(),
            states,
            completed: Vec::new(),
            outputs: Vec::new(),
            failure: None,
            finished: false,
        }
    }

    pub fn run_id(&self) -> u64 {
        self.run_id
    }

    pub fn target(&self) -> &str {
        &self.target
    }

    pub fn graph(&self) -> &Arc<TaskGraph> {
        &self.graph
    }

    pub fn state_of(&self, task: &str) -> TaskRunState {
        TaskRunState::from(self.states.get(task).copied())
    }

    /// Participating task names in declaration order.
    pub fn participants(&self) -> Vec<TaskName> {
        self.graph
            .tasks()
            .filter(|name| self.states.contains_key(*name))
            .map(str::to_string)
            .collect()
    }

    pub fn deps_satisfied(&self, task: &str) -> bool {
        deps_satisfied(&self.graph, &self.states, task)
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    pub fn failure(&self) -> Option<&TaskFailure> {
        self.failure.as_ref()
    }

    /// Dispatch the initial ready set.
    pub fn start(&mut self) -> SchedulerStep {
        info!(run_id = self.run_id, target = %self.target, tasks = self.states.len(), "starting build run");
        let newly_scheduled = self.manager().collect_new_ready_tasks();
        let run_just_finished = self.check_finished();
        SchedulerStep {
            newly_scheduled,
            newly_failed: Vec::new(),
            run_just_finished,
        }
    }

    /// Record the outcome of a running task and return what became ready.
    pub fn handle_completion(&mut self, task: &str, outcome: TaskOutcome) -> SchedulerStep {
        if self.states.get(task) != Some(&RunState::Running) {
            warn!(
                task = %task,
                run_id = self.run_id,
                state = ?self.state_of(task),
                "completion for a task that is not running in this run; ignoring"
            );
            return SchedulerStep::default();
        }

        let mut newly_failed = Vec::new();
        match outcome {
            TaskOutcome::Success(output) => {
                info!(
                    task = %task,
                    run_id = self.run_id,
                    written = output.written.len(),
                    "task completed"
                );
                self.states.insert(task.to_string(), RunState::DoneSuccess);
                self.completed.push(task.to_string());
                self.outputs.extend(output.written);
            }
            TaskOutcome::Failed(message) => {
                error!(task = %task, run_id = self.run_id, error = %message, "task failed");
                self.states.insert(task.to_string(), RunState::DoneFailed);
                newly_failed.push(task.to_string());
                if self.failure.is_none() {
                    self.failure = Some(TaskFailure {
                        task: task.to_string(),
                        message,
                    });
                }
                newly_failed.extend(self.manager().skip_pending());
            }
        }

        let newly_scheduled = if self.failure.is_none() {
            self.manager().collect_new_ready_tasks()
        } else {
            Vec::new()
        };
        let run_just_finished = self.check_finished();

        SchedulerStep {
            newly_scheduled,
            newly_failed,
            run_just_finished,
        }
    }

    /// Final report. Tasks still pending or running are listed as skipped.
    pub fn into_report(self) -> BuildReport {
        let skipped = self
            .graph
            .tasks()
            .filter(|name| {
                matches!(
                    self.states.get(*name),
                    Some(RunState::Skipped | RunState::Pending | RunState::Running)
                )
            })
            .map(str::to_string)
            .collect();

        BuildReport {
            run_id: self.run_id,
            target: self.target,
            completed: self.completed,
            skipped,
            outputs: self.outputs,
            failure: self.failure,
        }
    }

    fn manager(&mut self) -> StateManager<'_> {
        StateManager::new(&self.graph, &mut self.states, self.run_id)
    }

    fn check_finished(&mut self) -> bool {
        if self.finished {
            return false;
        }
        let manager = StateManager::new(&self.graph, &mut self.states, self.run_id);
        if manager.all_tasks_terminal() {
            self.finished = true;
            info!(
                run_id = self.run_id,
                target = %self.target,
                completed = self.completed.len(),
                failed = self.failure.is_some(),
                "build run finished"
            );
            return true;
        }
        false
    }
}
