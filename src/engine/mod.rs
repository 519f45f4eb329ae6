// src/engine/mod.rs

//! Orchestration engine for build runs.
//!
//! The pure core state machine lives in [`core`]; the async/IO shell that
//! reads completion events and dispatches ready tasks to an executor is
//! implemented in [`runtime`].

use crate::dag::{BuildReport, BuildRun, Scheduler};
use crate::errors::Result;
use crate::exec::RealExecutorBackend;
use crate::transform::TransformOutput;

/// Canonical task name type used throughout the engine.
pub type TaskName = String;

/// Outcome of a task action for the build run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskOutcome {
    Success(TransformOutput),
    Failed(String),
}

/// Events flowing into the runtime from the executor.
#[derive(Debug, Clone)]
pub enum RuntimeEvent {
    /// A dispatched task finished.
    TaskCompleted {
        task: TaskName,
        run_id: u64,
        outcome: TaskOutcome,
    },
}

pub mod core;
pub mod event_handlers;
pub mod runtime;

pub use self::core::CoreRuntime;
pub use event_handlers::{CoreCommand, CoreStep};
pub use runtime::Runtime;

/// Capacity of the runtime event channel.
pub const EVENT_CHANNEL_CAPACITY: usize = 64;

/// Drive `run` to completion with the real executor.
///
/// The returned report carries any action failure; `Err` is reserved for
/// the engine itself breaking down.
pub async fn execute(run: BuildRun) -> Result<BuildReport> {
    let (rt_tx, rt_rx) = tokio::sync::mpsc::channel::<RuntimeEvent>(EVENT_CHANNEL_CAPACITY);
    let executor = RealExecutorBackend::new(rt_tx);
    Runtime::new(CoreRuntime::new(run), rt_rx, executor).run().await
}

/// Run `target` and its prerequisites; an action failure becomes
/// [`crate::errors::AssetdagError::TaskFailed`].
pub async fn run_target(scheduler: &Scheduler, target: &str) -> Result<BuildReport> {
    let run = scheduler.begin(target)?;
    execute(run).await?.into_result()
}

/// Run `root` and everything that transitively depends on it; prerequisites
/// outside that set count as already built.
pub async fn run_with_dependents(scheduler: &Scheduler, root: &str) -> Result<BuildReport> {
    let run = scheduler.begin_with_dependents(root)?;
    execute(run).await?.into_result()
}
