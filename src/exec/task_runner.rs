// src/exec/task_runner.rs

//! Runs a single task's action.

use std::sync::Arc;
use std::time::Instant;

use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::dag::{ScheduledTask, TaskAction};
use crate::engine::{RuntimeEvent, TaskOutcome};
use crate::transform::TransformOutput;

/// Run `task`'s action and report a `TaskCompleted` event to the runtime.
pub async fn run_task(task: ScheduledTask, runtime_tx: mpsc::Sender<RuntimeEvent>) {
    let started = Instant::now();
    debug!(task = %task.name, run_id = task.run_id, action = ?task.action, "starting task");

    let outcome = invoke_action(&task.action).await;

    let elapsed_ms = started.elapsed().as_millis() as u64;
    if let TaskOutcome::Success(ref output) = outcome {
        if !task.action.is_aggregate() {
            info!(
                task = %task.name,
                run_id = task.run_id,
                elapsed_ms,
                written = output.written.len(),
                "finished"
            );
        }
    }

    let event = RuntimeEvent::TaskCompleted {
        task: task.name.clone(),
        run_id: task.run_id,
        outcome,
    };
    if runtime_tx.send(event).await.is_err() {
        warn!(task = %task.name, run_id = task.run_id, "runtime gone; dropping completion");
    }
}

/// Invoke an action and turn its result into a [`TaskOutcome`].
///
/// The unit runs in its own Tokio task; a panic becomes a failed outcome.
pub async fn invoke_action(action: &TaskAction) -> TaskOutcome {
    match action {
        TaskAction::Aggregate => TaskOutcome::Success(TransformOutput::default()),
        TaskAction::Transform(unit) => {
            let unit = Arc::clone(unit);
            match tokio::spawn(async move { unit.invoke().await }).await {
                Ok(Ok(output)) => TaskOutcome::Success(output),
                Ok(Err(err)) => TaskOutcome::Failed(err.to_string()),
                Err(join_err) => TaskOutcome::Failed(format!("action panicked: {join_err}")),
            }
        }
    }
}
