// tests/build_run.rs

mod common;
use crate::common::builders::{Recorder, chain_graph, diamond_graph};
use crate::common::{init_tracing, with_timeout};

use std::error::Error;
use std::time::Duration;

use assetdag::dag::{Scheduler, TaskGraph, TaskRunState};
use assetdag::engine;
use assetdag::errors::AssetdagError;
use assetdag::transform::{TransformFuture, TransformUnit};

type TestResult = Result<(), Box<dyn Error>>;

#[tokio::test]
async fn chain_runs_in_prerequisite_order() -> TestResult {
    init_tracing();
    let rec = Recorder::new();
    let scheduler = Scheduler::new(chain_graph(&rec, &["A", "B", "C"])?);

    let report = with_timeout(engine::run_target(&scheduler, "C")).await?;

    assert_eq!(
        rec.events(),
        vec!["start:A", "end:A", "start:B", "end:B", "start:C", "end:C"]
    );
    assert_eq!(report.completed, vec!["A", "B", "C"]);
    assert!(report.is_success());
    Ok(())
}

#[tokio::test]
async fn target_runs_only_its_prerequisites() -> TestResult {
    init_tracing();
    let rec = Recorder::new();
    let scheduler = Scheduler::new(chain_graph(&rec, &["A", "B", "C"])?);

    with_timeout(engine::run_target(&scheduler, "B")).await?;

    assert_eq!(rec.started(), vec!["A", "B"]);
    Ok(())
}

#[tokio::test]
async fn shared_prerequisite_runs_once_per_run() -> TestResult {
    init_tracing();
    let rec = Recorder::new();
    let scheduler = Scheduler::new(diamond_graph(&rec)?);

    with_timeout(engine::run_target(&scheduler, "bottom")).await?;

    for name in ["top", "left", "right", "bottom"] {
        assert_eq!(rec.count(name), 1, "{name} should run exactly once");
    }
    let end_top = rec.position("end:top").unwrap();
    let start_bottom = rec.position("start:bottom").unwrap();
    assert!(end_top < rec.position("start:left").unwrap());
    assert!(end_top < rec.position("start:right").unwrap());
    assert!(rec.position("end:left").unwrap() < start_bottom);
    assert!(rec.position("end:right").unwrap() < start_bottom);
    Ok(())
}

#[tokio::test]
async fn each_run_starts_fresh() -> TestResult {
    init_tracing();
    let rec = Recorder::new();
    let scheduler = Scheduler::new(chain_graph(&rec, &["A", "B"])?);

    let first = with_timeout(engine::run_target(&scheduler, "B")).await?;
    let second = with_timeout(engine::run_target(&scheduler, "B")).await?;

    assert_eq!(rec.count("A"), 2);
    assert_ne!(first.run_id, second.run_id);
    Ok(())
}

#[tokio::test]
async fn failure_stops_dependents() -> TestResult {
    init_tracing();
    let rec = Recorder::new();
    let graph = TaskGraph::builder()
        .task("A", Vec::<String>::new(), rec.unit("A").action())
        .task("B", ["A"], rec.unit("B").failing("boom").action())
        .task("C", ["B"], rec.unit("C").action())
        .build()?;
    let scheduler = Scheduler::new(graph);

    let err = with_timeout(engine::run_target(&scheduler, "C"))
        .await
        .unwrap_err();

    match err {
        AssetdagError::TaskFailed { task, message } => {
            assert_eq!(task, "B");
            assert!(message.contains("boom"), "{message}");
        }
        other => panic!("expected TaskFailed, got {other:?}"),
    }
    assert_eq!(rec.count("C"), 0);
    Ok(())
}

#[tokio::test]
async fn failure_skips_pending_siblings() -> TestResult {
    init_tracing();
    let rec = Recorder::new();
    // `slow` is still pending on `gate` when `fast` fails.
    let graph = TaskGraph::builder()
        .task("root", Vec::<String>::new(), rec.unit("root").action())
        .task("fast", ["root"], rec.unit("fast").failing("bad input").action())
        .task(
            "gate",
            ["root"],
            rec.unit("gate").with_delay(Duration::from_millis(50)).action(),
        )
        .task("slow", ["gate"], rec.unit("slow").action())
        .task("all", ["fast", "slow"], rec.unit("all").action())
        .build()?;
    let scheduler = Scheduler::new(graph);

    let run = scheduler.begin("all")?;
    let report = with_timeout(engine::execute(run)).await?;

    assert!(!report.is_success());
    assert_eq!(report.failure.as_ref().map(|f| f.task.as_str()), Some("fast"));
    assert_eq!(rec.count("slow"), 0);
    assert_eq!(rec.count("all"), 0);
    assert!(report.skipped.contains(&"slow".to_string()));
    // Already started work is not cancelled.
    assert_eq!(rec.count("gate"), 1);
    Ok(())
}

#[derive(Debug)]
struct PanickingUnit;

impl TransformUnit for PanickingUnit {
    fn name(&self) -> &str {
        "panicking"
    }

    fn invoke(&self) -> TransformFuture<'_> {
        Box::pin(async { panic!("unit exploded") })
    }
}

#[tokio::test]
async fn panicking_action_fails_the_run() -> TestResult {
    init_tracing();
    let graph = TaskGraph::builder()
        .task(
            "A",
            Vec::<String>::new(),
            assetdag::dag::TaskAction::transform(PanickingUnit),
        )
        .build()?;
    let scheduler = Scheduler::new(graph);

    let err = with_timeout(engine::run_target(&scheduler, "A"))
        .await
        .unwrap_err();
    assert!(matches!(err, AssetdagError::TaskFailed { ref task, .. } if task == "A"));
    Ok(())
}

#[tokio::test]
async fn dependents_run_treats_outside_prerequisites_as_done() -> TestResult {
    init_tracing();
    let rec = Recorder::new();
    let scheduler = Scheduler::new(chain_graph(&rec, &["A", "B", "C"])?);

    let run = scheduler.begin_with_dependents("B")?;
    assert_eq!(run.state_of("A"), TaskRunState::NotInRun);
    assert_eq!(run.state_of("B"), TaskRunState::Pending);

    let report = with_timeout(engine::execute(run)).await?;

    assert!(report.is_success());
    assert_eq!(rec.started(), vec!["B", "C"]);
    Ok(())
}

#[tokio::test]
async fn run_with_dependents_skips_upstream_tasks() -> TestResult {
    init_tracing();
    let rec = Recorder::new();
    let scheduler = Scheduler::new(diamond_graph(&rec)?);

    let report = with_timeout(engine::run_with_dependents(&scheduler, "left")).await?;

    assert_eq!(report.completed, vec!["left", "bottom"]);
    assert_eq!(rec.count("top"), 0);
    assert_eq!(rec.count("right"), 0);
    Ok(())
}
