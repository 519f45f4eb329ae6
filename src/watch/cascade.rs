// src/watch/cascade.rs

use std::sync::Arc;

use crate::dag::Scheduler;
use crate::engine::{self, TaskName};
use crate::errors::AssetdagError;
use crate::transform::{TransformError, TransformFuture, TransformOutput, TransformUnit};

/// Watch action that re-runs a task together with every task depending on it.
///
/// The sub-run goes through the regular engine, so ordering and fail-fast
/// behave as in a full build.
#[derive(Debug, Clone)]
pub struct CascadeUnit {
    scheduler: Arc<Scheduler>,
    task: TaskName,
    label: String,
}

impl CascadeUnit {
    pub fn new(scheduler: Arc<Scheduler>, task: impl Into<TaskName>) -> Self {
        let task = task.into();
        let label = format!("{task}+dependents");
        Self {
            scheduler,
            task,
            label,
        }
    }

    pub fn task(&self) -> &str {
        &self.task
    }
}

impl TransformUnit for CascadeUnit {
    fn name(&self) -> &str {
        &self.label
    }

    fn invoke(&self) -> TransformFuture<'_> {
        Box::pin(async move {
            match engine::run_with_dependents(&self.scheduler, &self.task).await {
                Ok(report) => Ok(TransformOutput {
                    written: report.outputs,
                }),
                Err(AssetdagError::TaskFailed { task, message }) => {
                    Err(TransformError::Upstream { task, message })
                }
                Err(other) => Err(anyhow::Error::from(other).into()),
            }
        })
    }
}
