// src/dag/scheduler_step.rs

//! Step-by-step execution result types for a build run.

use crate::dag::task_info::ScheduledTask;
use crate::engine::TaskName;

/// Structured result of a single build-run "step".
///
/// Tests use it to step a run by hand and assert on what changed.
#[derive(Debug, Clone, Default)]
pub struct SchedulerStep {
    /// Tasks that became ready to run as a result of this step.
    pub newly_scheduled: Vec<ScheduledTask>,
    /// Tasks newly marked as failed or skipped in this step (the failed task
    /// first, then everything that will no longer start).
    pub newly_failed: Vec<TaskName>,
    /// Whether this step finished the run.
    pub run_just_finished: bool,
}
