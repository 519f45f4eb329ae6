use std::collections::HashSet;
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex};

use assetdag::dag::ScheduledTask;
use assetdag::engine::{RuntimeEvent, TaskOutcome};
use assetdag::errors::Result;
use assetdag::exec::ExecutorBackend;
use assetdag::transform::TransformOutput;
use tokio::sync::mpsc;

/// A fake executor that:
/// - records which tasks were "run"
/// - immediately reports TaskCompleted for each scheduled task, failing
///   the ones registered with [`FakeExecutor::failing`].
pub struct FakeExecutor {
    runtime_tx: mpsc::Sender<RuntimeEvent>,
    executed: Arc<Mutex<Vec<String>>>,
    failing: HashSet<String>,
}

impl FakeExecutor {
    pub fn new(runtime_tx: mpsc::Sender<RuntimeEvent>, executed: Arc<Mutex<Vec<String>>>) -> Self {
        Self {
            runtime_tx,
            executed,
            failing: HashSet::new(),
        }
    }

    pub fn failing(mut self, task: &str) -> Self {
        self.failing.insert(task.to_string());
        self
    }
}

impl ExecutorBackend for FakeExecutor {
    fn spawn_ready_tasks(
        &mut self,
        tasks: Vec<ScheduledTask>,
    ) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>> {
        let tx = self.runtime_tx.clone();
        let executed = Arc::clone(&self.executed);
        let failing = self.failing.clone();

        Box::pin(async move {
            for t in tasks {
                {
                    let mut guard = executed.lock().unwrap();
                    guard.push(t.name.clone());
                }

                let outcome = if failing.contains(&t.name) {
                    TaskOutcome::Failed(format!("{} failed", t.name))
                } else {
                    TaskOutcome::Success(TransformOutput::default())
                };

                tx.send(RuntimeEvent::TaskCompleted {
                    task: t.name.clone(),
                    run_id: t.run_id,
                    outcome,
                })
                .await
                .map_err(anyhow::Error::from)?;
            }
            Ok(())
        })
    }
}
