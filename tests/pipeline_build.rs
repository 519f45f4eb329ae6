// tests/pipeline_build.rs

mod common;
use crate::common::{init_tracing, read, snapshot, standard_project, with_timeout, write};

use std::error::Error;

use assetdag::cli::CliArgs;
use assetdag::config::ConfigFile;
use assetdag::dag::Scheduler;
use assetdag::engine;
use assetdag::errors::AssetdagError;
use assetdag::pipeline::{BUILD, COMPILE_STYLUS, standard_graph};

type TestResult = Result<(), Box<dyn Error>>;

fn args(config: &std::path::Path, task: &str) -> CliArgs {
    CliArgs {
        task: task.to_string(),
        config: config.to_string_lossy().into_owned(),
        port: None,
        no_open: true,
        log_level: None,
        dry_run: false,
    }
}

#[tokio::test]
async fn build_produces_the_output_tree() -> TestResult {
    init_tracing();
    let tmp = standard_project();
    let root = tmp.path();
    let cfg = ConfigFile::default();
    let scheduler = Scheduler::new(standard_graph(&cfg, root, false)?);

    let report = with_timeout(engine::run_target(&scheduler, BUILD)).await?;

    assert_eq!(report.completed.len(), 8);
    for rel in [
        "src/dist/index.html",
        "src/dist/index.html.gz",
        "src/dist/css/main.css",
        "src/dist/css/main.css.gz",
        "src/dist/css/sprite/svg-sprite.svg",
        "src/dist/fonts/roboto.woff",
        "src/dist/js/app.js",
        "src/dist/js/app.js.gz",
    ] {
        assert!(root.join(rel).is_file(), "missing {rel}");
    }

    let css = read(root, "src/dist/css/main.css");
    assert!(css.contains(".svg-common"), "{css}");
    assert!(css.contains(".arrow"), "{css}");
    assert!(css.contains("color:red") || css.contains("color:#ff0000"), "{css}");
    Ok(())
}

#[tokio::test]
async fn building_twice_is_byte_identical() -> TestResult {
    init_tracing();
    let tmp = standard_project();
    let root = tmp.path();
    let cfg = ConfigFile::default();
    let scheduler = Scheduler::new(standard_graph(&cfg, root, false)?);

    with_timeout(engine::run_target(&scheduler, BUILD)).await?;
    let first = snapshot(&root.join("src/dist"));
    with_timeout(engine::run_target(&scheduler, BUILD)).await?;
    let second = snapshot(&root.join("src/dist"));

    assert!(!first.is_empty());
    assert_eq!(first, second);
    Ok(())
}

#[tokio::test]
async fn stale_output_is_removed_by_a_full_build() -> TestResult {
    init_tracing();
    let tmp = standard_project();
    let root = tmp.path();
    write(root, "src/dist/old.html", "stale");
    let cfg = ConfigFile::default();
    let scheduler = Scheduler::new(standard_graph(&cfg, root, false)?);

    with_timeout(engine::run_target(&scheduler, BUILD)).await?;

    assert!(!root.join("src/dist/old.html").exists());
    Ok(())
}

#[tokio::test]
async fn broken_stylesheet_fails_the_build() -> TestResult {
    init_tracing();
    let tmp = standard_project();
    let root = tmp.path();
    write(root, "src/app/styles/main.scss", "body { color: ");
    let cfg = ConfigFile::default();
    let scheduler = Scheduler::new(standard_graph(&cfg, root, false)?);

    let err = with_timeout(engine::run_target(&scheduler, BUILD))
        .await
        .unwrap_err();

    match err {
        AssetdagError::TaskFailed { task, .. } => assert_eq!(task, COMPILE_STYLUS),
        other => panic!("expected TaskFailed, got {other:?}"),
    }
    Ok(())
}

#[tokio::test]
async fn run_builds_the_project_next_to_the_config() -> TestResult {
    init_tracing();
    let tmp = standard_project();
    let root = tmp.path();
    write(
        root,
        "Assetdag.toml",
        "[output]\ngzip = false\nminify_js = false\n",
    );

    with_timeout(assetdag::run(args(&root.join("Assetdag.toml"), "compileJS"))).await?;

    assert_eq!(read(root, "src/dist/js/app.js"), "var a = 1;console.log(a)");
    assert!(!root.join("src/dist/js/app.js.gz").exists());
    // compileJS does not reach the stylesheet task.
    assert!(!root.join("src/dist/css").exists());
    Ok(())
}

#[tokio::test]
async fn run_rejects_unknown_tasks() {
    init_tracing();
    let tmp = standard_project();
    write(tmp.path(), "Assetdag.toml", "");

    let err = assetdag::run(args(&tmp.path().join("Assetdag.toml"), "compileCoffee"))
        .await
        .unwrap_err();
    assert!(matches!(err, AssetdagError::TaskNotFound(ref t) if t == "compileCoffee"));
}

#[tokio::test]
async fn run_rejects_a_zero_port_override() {
    init_tracing();
    let tmp = standard_project();
    write(tmp.path(), "Assetdag.toml", "");

    let mut zero = args(&tmp.path().join("Assetdag.toml"), "build");
    zero.port = Some(0);
    let err = assetdag::run(zero).await.unwrap_err();

    assert!(matches!(err, AssetdagError::ConfigError(ref m) if m.contains("port")), "got {err:?}");
    // Rejected before the build started.
    assert!(!tmp.path().join("src/dist").exists());
}

#[tokio::test]
async fn failed_build_does_not_start_the_server() -> TestResult {
    init_tracing();
    let tmp = standard_project();
    let root = tmp.path();
    write(root, "src/app/styles/main.scss", "body { color: ");
    write(root, "Assetdag.toml", "[output]\nminify_js = false\n");

    let port = std::net::TcpListener::bind("127.0.0.1:0")?.local_addr()?.port();
    let mut serve = args(&root.join("Assetdag.toml"), "webserver");
    serve.port = Some(port);

    // A started server would wait for Ctrl-C and hit the timeout instead.
    let err = with_timeout(assetdag::run(serve)).await.unwrap_err();

    match err {
        AssetdagError::TaskFailed { task, .. } => assert_eq!(task, COMPILE_STYLUS),
        other => panic!("expected TaskFailed, got {other:?}"),
    }
    assert!(std::net::TcpStream::connect(("127.0.0.1", port)).is_err());
    Ok(())
}

#[tokio::test]
async fn dry_run_touches_nothing() -> TestResult {
    init_tracing();
    let tmp = standard_project();
    let root = tmp.path();
    write(root, "Assetdag.toml", "");
    let before = snapshot(root);

    let mut dry = args(&root.join("Assetdag.toml"), "watch");
    dry.dry_run = true;
    assetdag::run(dry).await?;

    assert_eq!(snapshot(root), before);
    Ok(())
}
