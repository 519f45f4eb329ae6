// src/engine/core.rs

//! Pure core runtime state machine.
//!
//! Consumes [`RuntimeEvent`]s and produces the commands the IO shell should
//! execute. No channels, Tokio types, filesystem or actions are involved, so
//! a whole build run can be stepped synchronously in tests.

use crate::dag::{BuildReport, BuildRun};
use crate::engine::RuntimeEvent;
use crate::engine::event_handlers::{CoreStep, handle_run_start, handle_task_completion};

#[derive(Debug)]
pub struct CoreRuntime {
    run: BuildRun,
}

impl CoreRuntime {
    pub fn new(run: BuildRun) -> Self {
        Self { run }
    }

    pub fn build_run(&self) -> &BuildRun {
        &self.run
    }

    pub fn is_finished(&self) -> bool {
        self.run.is_finished()
    }

    /// Initial step: dispatch tasks without prerequisites in the run.
    pub fn start(&mut self) -> CoreStep {
        handle_run_start(&mut self.run)
    }

    /// Handle a single runtime event.
    pub fn step(&mut self, event: RuntimeEvent) -> CoreStep {
        match event {
            RuntimeEvent::TaskCompleted {
                task,
                run_id,
                outcome,
            } => handle_task_completion(&mut self.run, task, run_id, outcome),
        }
    }

    pub fn into_report(self) -> BuildReport {
        self.run.into_report()
    }
}
