// src/exec/backend.rs

//! Pluggable executor backend abstraction.
//!
//! The runtime talks to an `ExecutorBackend` instead of a raw mpsc sender,
//! so tests can provide an implementation that records scheduled tasks and
//! emits `TaskCompleted` events directly.

use std::future::Future;
use std::pin::Pin;

use anyhow::anyhow;
use tokio::sync::mpsc;

use crate::dag::ScheduledTask;
use crate::engine::RuntimeEvent;
use crate::errors::Result;

use super::executor_loop::spawn_executor;

/// Trait abstracting how scheduled tasks are executed.
pub trait ExecutorBackend: Send {
    /// Dispatch the given tasks for execution. Completion is reported later
    /// through the runtime event channel.
    fn spawn_ready_tasks(
        &mut self,
        tasks: Vec<ScheduledTask>,
    ) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>>;
}

/// Real executor backend used in production.
///
/// Forwards scheduled tasks to the background loop started by
/// [`spawn_executor`], which runs each action in its own Tokio task.
pub struct RealExecutorBackend {
    tx: mpsc::Sender<ScheduledTask>,
}

impl RealExecutorBackend {
    /// Create the backend and start its executor loop immediately.
    pub fn new(runtime_tx: mpsc::Sender<RuntimeEvent>) -> Self {
        let tx = spawn_executor(runtime_tx);
        Self { tx }
    }
}

impl ExecutorBackend for RealExecutorBackend {
    fn spawn_ready_tasks(
        &mut self,
        tasks: Vec<ScheduledTask>,
    ) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>> {
        let tx = self.tx.clone();

        Box::pin(async move {
            for task in tasks {
                tx.send(task)
                    .await
                    .map_err(|e| anyhow!("executor loop stopped: {e}"))?;
            }
            Ok(())
        })
    }
}
