// src/exec/executor_loop.rs

//! Background loop that runs scheduled tasks.

use std::collections::HashMap;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::dag::ScheduledTask;
use crate::engine::{RuntimeEvent, TaskName, TaskOutcome};
use crate::exec::task_runner::run_task;

/// Spawn the background executor loop.
///
/// Each scheduled task runs in its own Tokio task. Per task name there is
/// never more than one action running: a second request for a task whose
/// previous instance is still running completes at once as failed, so the
/// runtime waiting on it still hears back.
pub fn spawn_executor(runtime_tx: mpsc::Sender<RuntimeEvent>) -> mpsc::Sender<ScheduledTask> {
    let (tx, mut rx) = mpsc::channel::<ScheduledTask>(32);

    tokio::spawn(async move {
        debug!("executor loop started");

        let mut active: HashMap<TaskName, JoinHandle<()>> = HashMap::new();

        while let Some(task) = rx.recv().await {
            active.retain(|_, handle| !handle.is_finished());

            if active.contains_key(&task.name) {
                warn!(
                    task = %task.name,
                    run_id = task.run_id,
                    "task already running; rejecting duplicate dispatch"
                );
                let event = RuntimeEvent::TaskCompleted {
                    task: task.name,
                    run_id: task.run_id,
                    outcome: TaskOutcome::Failed("already running".into()),
                };
                if runtime_tx.send(event).await.is_err() {
                    break;
                }
                continue;
            }

            let name = task.name.clone();
            let rt_tx = runtime_tx.clone();
            let handle = tokio::spawn(run_task(task, rt_tx));
            active.insert(name, handle);
        }

        debug!("executor loop finished (channel closed)");
    });

    tx
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::dag::TaskAction;
    use crate::transform::{TransformFuture, TransformOutput, TransformUnit};

    #[derive(Debug)]
    struct Slow;

    impl TransformUnit for Slow {
        fn name(&self) -> &str {
            "slow"
        }

        fn invoke(&self) -> TransformFuture<'_> {
            Box::pin(async {
                tokio::time::sleep(Duration::from_secs(1)).await;
                Ok(TransformOutput::default())
            })
        }
    }

    #[tokio::test(start_paused = true)]
    async fn duplicate_dispatch_is_reported_as_failed() {
        let (rt_tx, mut rt_rx) = mpsc::channel(8);
        let exec = spawn_executor(rt_tx);
        let task = ScheduledTask {
            name: "slow".into(),
            action: TaskAction::transform(Slow),
            run_id: 1,
        };

        exec.send(task.clone()).await.unwrap();
        exec.send(task).await.unwrap();

        let RuntimeEvent::TaskCompleted { outcome, .. } = rt_rx.recv().await.unwrap();
        assert!(matches!(outcome, TaskOutcome::Failed(ref m) if m.contains("already running")));
        let RuntimeEvent::TaskCompleted { outcome, .. } = rt_rx.recv().await.unwrap();
        assert!(matches!(outcome, TaskOutcome::Success(_)));
    }
}
