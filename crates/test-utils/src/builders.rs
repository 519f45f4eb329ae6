#![allow(dead_code)]

use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use assetdag::dag::{TaskAction, TaskGraph};
use assetdag::errors::Result;
use assetdag::transform::{
    TransformError, TransformFuture, TransformOutput, TransformUnit,
};

/// Shared, ordered log of `start:<name>` / `end:<name>` events.
#[derive(Debug, Clone, Default)]
pub struct Recorder {
    events: Arc<Mutex<Vec<String>>>,
}

impl Recorder {
    pub fn new() -> Self {
        Self::default()
    }

    /// A unit named `name` that logs into this recorder.
    pub fn unit(&self, name: &str) -> RecordingUnit {
        RecordingUnit {
            name: name.to_string(),
            events: Arc::clone(&self.events),
            fail_with: None,
            delay: None,
            outputs: Vec::new(),
        }
    }

    pub fn events(&self) -> Vec<String> {
        self.events.lock().unwrap().clone()
    }

    /// Names in the order they started.
    pub fn started(&self) -> Vec<String> {
        self.events()
            .into_iter()
            .filter_map(|e| e.strip_prefix("start:").map(str::to_string))
            .collect()
    }

    /// How many times `name` was invoked.
    pub fn count(&self, name: &str) -> usize {
        let needle = format!("start:{name}");
        self.events().iter().filter(|e| **e == needle).count()
    }

    pub fn position(&self, event: &str) -> Option<usize> {
        self.events().iter().position(|e| e == event)
    }
}

/// A transform that only records its invocations.
#[derive(Debug, Clone)]
pub struct RecordingUnit {
    name: String,
    events: Arc<Mutex<Vec<String>>>,
    fail_with: Option<String>,
    delay: Option<Duration>,
    outputs: Vec<PathBuf>,
}

impl RecordingUnit {
    pub fn failing(mut self, message: &str) -> Self {
        self.fail_with = Some(message.to_string());
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn with_outputs<I, P>(mut self, outputs: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        self.outputs = outputs.into_iter().map(Into::into).collect();
        self
    }

    pub fn action(self) -> TaskAction {
        TaskAction::transform(self)
    }

    pub fn shared(self) -> Arc<dyn TransformUnit> {
        Arc::new(self)
    }
}

impl TransformUnit for RecordingUnit {
    fn name(&self) -> &str {
        &self.name
    }

    fn invoke(&self) -> TransformFuture<'_> {
        Box::pin(async move {
            self.events
                .lock()
                .unwrap()
                .push(format!("start:{}", self.name));

            if let Some(delay) = self.delay {
                tokio::time::sleep(delay).await;
            }

            self.events
                .lock()
                .unwrap()
                .push(format!("end:{}", self.name));

            match &self.fail_with {
                Some(message) => Err(TransformError::Other(anyhow::anyhow!("{message}"))),
                None => Ok(TransformOutput {
                    written: self.outputs.clone(),
                }),
            }
        })
    }
}

/// `names[0] <- names[1] <- ...`: each task depends on the previous one.
pub fn chain_graph(recorder: &Recorder, names: &[&str]) -> Result<TaskGraph> {
    let mut builder = TaskGraph::builder();
    for (i, name) in names.iter().enumerate() {
        let prereqs: Vec<&str> = if i == 0 { vec![] } else { vec![names[i - 1]] };
        builder = builder.task(*name, prereqs, recorder.unit(name).action());
    }
    builder.build()
}

/// Diamond `top <- left, right <- bottom`.
pub fn diamond_graph(recorder: &Recorder) -> Result<TaskGraph> {
    TaskGraph::builder()
        .task("top", Vec::<String>::new(), recorder.unit("top").action())
        .task("left", ["top"], recorder.unit("left").action())
        .task("right", ["top"], recorder.unit("right").action())
        .task("bottom", ["left", "right"], recorder.unit("bottom").action())
        .build()
}

/// Graph from an adjacency list where `deps[i]` only names indices `< i`.
/// Tasks are named `t0`, `t1`, ...
pub fn indexed_graph(recorder: &Recorder, deps: &[Vec<usize>]) -> Result<TaskGraph> {
    let mut builder = TaskGraph::builder();
    for (i, prereqs) in deps.iter().enumerate() {
        let name = format!("t{i}");
        let prereqs: Vec<String> = prereqs.iter().map(|d| format!("t{d}")).collect();
        builder = builder.task(name.clone(), prereqs, recorder.unit(&name).action());
    }
    builder.build()
}
