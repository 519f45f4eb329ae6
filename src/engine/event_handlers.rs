// src/engine/event_handlers.rs

//! Event handling logic for the core runtime.

use tracing::debug;

use crate::dag::{BuildRun, ScheduledTask, SchedulerStep};
use crate::engine::{TaskName, TaskOutcome};

/// Command produced by the pure core, to be executed by the outer IO shell.
#[derive(Debug, Clone)]
pub enum CoreCommand {
    /// Send these tasks to the executor.
    DispatchTasks(Vec<ScheduledTask>),
    /// The run is finished; the shell should stop.
    RequestExit,
}

/// Decision returned by the core after handling a single event.
#[derive(Debug, Clone)]
pub struct CoreStep {
    pub commands: Vec<CoreCommand>,
    /// Whether the outer runtime loop should keep running.
    pub keep_running: bool,
}

impl CoreStep {
    fn from_scheduler_step(step: SchedulerStep, finished: bool) -> Self {
        let mut commands = Vec::new();
        if !step.newly_scheduled.is_empty() {
            commands.push(CoreCommand::DispatchTasks(step.newly_scheduled));
        }
        if finished {
            commands.push(CoreCommand::RequestExit);
        }
        CoreStep {
            commands,
            keep_running: !finished,
        }
    }
}

/// Seed the run with its initial ready set.
pub fn handle_run_start(run: &mut BuildRun) -> CoreStep {
    let step = run.start();
    let finished = run.is_finished();
    CoreStep::from_scheduler_step(step, finished)
}

/// Record a completion and dispatch whatever became ready.
///
/// Completions carrying another run's id are ignored.
pub fn handle_task_completion(
    run: &mut BuildRun,
    task: TaskName,
    run_id: u64,
    outcome: TaskOutcome,
) -> CoreStep {
    if run_id != run.run_id() {
        debug!(
            task = %task,
            run_id,
            current = run.run_id(),
            "ignoring completion from another run"
        );
        return CoreStep {
            commands: Vec::new(),
            keep_running: !run.is_finished(),
        };
    }

    let step = run.handle_completion(&task, outcome);
    if !step.newly_failed.is_empty() {
        debug!(failed = ?step.newly_failed, "tasks failed or skipped");
    }
    let finished = run.is_finished();
    CoreStep::from_scheduler_step(step, finished)
}
