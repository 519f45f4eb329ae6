// tests/runtime_fake_executor.rs

mod common;
use crate::common::builders::{Recorder, chain_graph, diamond_graph};
use crate::common::{init_tracing, with_timeout};

use std::error::Error;
use std::sync::{Arc, Mutex};

use tokio::sync::mpsc;

use assetdag::dag::{BuildRun, Scheduler};
use assetdag::engine::{CoreRuntime, EVENT_CHANNEL_CAPACITY, Runtime, RuntimeEvent};
use assetdag_test_utils::fake_executor::FakeExecutor;

type TestResult = Result<(), Box<dyn Error>>;

fn runtime_with(
    run: BuildRun,
    failing: &[&str],
) -> (Runtime<FakeExecutor>, Arc<Mutex<Vec<String>>>) {
    let (tx, rx) = mpsc::channel::<RuntimeEvent>(EVENT_CHANNEL_CAPACITY);
    let executed = Arc::new(Mutex::new(Vec::new()));
    let mut executor = FakeExecutor::new(tx, Arc::clone(&executed));
    for task in failing {
        executor = executor.failing(task);
    }
    (Runtime::new(CoreRuntime::new(run), rx, executor), executed)
}

#[tokio::test]
async fn runtime_dispatches_chain_in_order() -> TestResult {
    init_tracing();
    let rec = Recorder::new();
    let scheduler = Scheduler::new(chain_graph(&rec, &["A", "B", "C"])?);

    let (runtime, executed) = runtime_with(scheduler.begin("C")?, &[]);
    let report = with_timeout(runtime.run()).await?;

    assert_eq!(*executed.lock().unwrap(), vec!["A", "B", "C"]);
    assert!(report.is_success());
    // The fake executor never invokes the units themselves.
    assert!(rec.events().is_empty());
    Ok(())
}

#[tokio::test]
async fn runtime_dispatches_diamond_once_each() -> TestResult {
    init_tracing();
    let rec = Recorder::new();
    let scheduler = Scheduler::new(diamond_graph(&rec)?);

    let (runtime, executed) = runtime_with(scheduler.begin("bottom")?, &[]);
    with_timeout(runtime.run()).await?;

    let executed = executed.lock().unwrap().clone();
    assert_eq!(executed.len(), 4);
    assert_eq!(executed.first().map(String::as_str), Some("top"));
    assert_eq!(executed.last().map(String::as_str), Some("bottom"));
    Ok(())
}

#[tokio::test]
async fn runtime_reports_failure_and_skips_the_rest() -> TestResult {
    init_tracing();
    let rec = Recorder::new();
    let scheduler = Scheduler::new(chain_graph(&rec, &["A", "B", "C"])?);

    let (runtime, executed) = runtime_with(scheduler.begin("C")?, &["B"]);
    let report = with_timeout(runtime.run()).await?;

    assert_eq!(*executed.lock().unwrap(), vec!["A", "B"]);
    let failure = report.failure.as_ref().expect("run should fail");
    assert_eq!(failure.task, "B");
    assert_eq!(report.completed, vec!["A"]);
    assert_eq!(report.skipped, vec!["C"]);
    Ok(())
}
