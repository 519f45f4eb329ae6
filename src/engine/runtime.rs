// src/engine/runtime.rs

use std::fmt;

use anyhow::anyhow;
use tokio::sync::mpsc;
use tracing::{debug, info};

use crate::dag::{BuildReport, ScheduledTask};
use crate::errors::Result;
use crate::exec::ExecutorBackend;

use super::core::CoreRuntime;
use super::{CoreCommand, CoreStep, RuntimeEvent};

/// Drives one build run in response to `RuntimeEvent`s and delegates
/// action execution to an `ExecutorBackend`.
///
/// All semantics live in `CoreRuntime`; this shell only moves events and
/// tasks between channels.
pub struct Runtime<E: ExecutorBackend> {
    core: CoreRuntime,
    event_rx: mpsc::Receiver<RuntimeEvent>,
    executor: E,
}

impl<E: ExecutorBackend> fmt::Debug for Runtime<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Runtime")
            .field("core", &self.core)
            .finish_non_exhaustive()
    }
}

impl<E: ExecutorBackend> Runtime<E> {
    pub fn new(core: CoreRuntime, event_rx: mpsc::Receiver<RuntimeEvent>, executor: E) -> Self {
        Self {
            core,
            event_rx,
            executor,
        }
    }

    /// Main event loop. Returns when the run is finished.
    pub async fn run(mut self) -> Result<BuildReport> {
        let run_id = self.core.build_run().run_id();
        debug!(run_id, "runtime started");

        let step = self.core.start();
        let mut keep_running = self.apply(step).await?;

        while keep_running {
            let Some(event) = self.event_rx.recv().await else {
                return Err(anyhow!("runtime event channel closed before run {run_id} finished").into());
            };
            debug!(?event, "runtime received event");

            let step = self.core.step(event);
            keep_running = self.apply(step).await?;
        }

        info!(run_id, "runtime exiting");
        Ok(self.core.into_report())
    }

    async fn apply(&mut self, step: CoreStep) -> Result<bool> {
        for command in step.commands {
            self.execute_command(command).await?;
        }
        Ok(step.keep_running)
    }

    async fn execute_command(&mut self, command: CoreCommand) -> Result<()> {
        match command {
            CoreCommand::DispatchTasks(tasks) => self.spawn_ready(tasks).await,
            CoreCommand::RequestExit => {
                debug!("core issued RequestExit command");
                Ok(())
            }
        }
    }

    async fn spawn_ready(&mut self, tasks: Vec<ScheduledTask>) -> Result<()> {
        if tasks.is_empty() {
            return Ok(());
        }

        let names: Vec<_> = tasks.iter().map(|t| t.name.as_str()).collect();
        debug!(?names, "spawning ready tasks");

        self.executor.spawn_ready_tasks(tasks).await
    }
}
