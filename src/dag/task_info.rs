// src/dag/task_info.rs

//! Per-run task state and the description of a task handed to the executor.

use crate::dag::graph::TaskAction;
use crate::engine::TaskName;

/// Per-run state of a task (internal).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    /// Part of this run, waiting on prerequisites.
    Pending,
    /// Dispatched to the executor.
    Running,
    DoneSuccess,
    DoneFailed,
    /// Never started because the run failed first.
    Skipped,
}

impl RunState {
    pub fn is_terminal(self) -> bool {
        !matches!(self, RunState::Pending | RunState::Running)
    }
}

/// Public, read-only view of a task's per-run state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskRunState {
    /// The task does not participate in this run.
    NotInRun,
    Pending,
    Running,
    DoneSuccess,
    DoneFailed,
    Skipped,
}

impl From<Option<RunState>> for TaskRunState {
    fn from(state: Option<RunState>) -> Self {
        match state {
            None => TaskRunState::NotInRun,
            Some(RunState::Pending) => TaskRunState::Pending,
            Some(RunState::Running) => TaskRunState::Running,
            Some(RunState::DoneSuccess) => TaskRunState::DoneSuccess,
            Some(RunState::DoneFailed) => TaskRunState::DoneFailed,
            Some(RunState::Skipped) => TaskRunState::Skipped,
        }
    }
}

/// A task the run wants executed now.
#[derive(Debug, Clone)]
pub struct ScheduledTask {
    pub name: TaskName,
    pub action: TaskAction,
    /// Identifier shared by every task of the same build run.
    pub run_id: u64,
}
