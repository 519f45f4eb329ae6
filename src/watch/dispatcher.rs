// src/watch/dispatcher.rs

//! Per-glob debounced dispatch of file changes to actions.
//!
//! Each registered glob gets its own worker task and channel. A worker
//! waits for a first change, keeps absorbing further changes until the
//! debounce window passes without one, then runs its action once. Changes
//! that arrive while the action runs are buffered in the channel and lead
//! to exactly one follow-up run.
//!
//! In exclusive mode, used for cascading re-runs whose outputs overlap,
//! workers take turns through a shared lock and drop changes to files a
//! run has just written, so a run never re-triggers itself through the
//! watcher.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use globset::GlobMatcher;
use tokio::sync::{Mutex, broadcast, mpsc};
use tokio::time::Instant;
use tracing::{debug, error, info};

use crate::dag::TaskAction;
use crate::engine::TaskOutcome;
use crate::errors::{AssetdagError, Result};
use crate::exec::invoke_action;
use crate::transform::TransformUnit;
use crate::types::ReloadKind;
use crate::watch::ReloadSink;
use crate::watch::path_utils::{collapse_watch_roots, relative_str, watch_root_for};
use crate::watch::patterns::WatchBinding;
use crate::watch::watcher::{WatcherHandle, spawn_watcher};

/// Capacity of the report broadcast; slow subscribers see `Lagged`.
const REPORT_CHANNEL_CAPACITY: usize = 64;

/// Lower bound on how long a written output counts as a run's own change.
const MIN_ECHO_WINDOW: Duration = Duration::from_secs(1);

/// Result of one debounced re-run.
#[derive(Debug, Clone)]
pub struct WatchRunReport {
    /// Glob whose worker ran.
    pub pattern: String,
    /// Name of the action that ran.
    pub action: String,
    /// Relative paths that were coalesced into this run.
    pub changed: Vec<String>,
    /// Written outputs on success, the error message on failure.
    pub result: std::result::Result<Vec<PathBuf>, String>,
    /// Reload broadcast triggered by this run, if any.
    pub reload: Option<ReloadKind>,
}

impl WatchRunReport {
    pub fn is_success(&self) -> bool {
        self.result.is_ok()
    }
}

/// Collects glob bindings, then spawns one worker per binding.
pub struct WatchDispatcher {
    root: PathBuf,
    debounce: Duration,
    bindings: Vec<WatchBinding>,
    reload: Option<Arc<dyn ReloadSink>>,
    exclusive: bool,
}

impl WatchDispatcher {
    pub fn new(root: impl Into<PathBuf>, debounce: Duration) -> Self {
        Self {
            root: root.into(),
            debounce,
            bindings: Vec::new(),
            reload: None,
            exclusive: false,
        }
    }

    /// Run one binding's action at a time and ignore changes to files that
    /// a run wrote within the last few debounce windows.
    pub fn set_exclusive(&mut self, exclusive: bool) {
        self.exclusive = exclusive;
    }

    pub fn is_exclusive(&self) -> bool {
        self.exclusive
    }

    /// Offer successful re-run outputs to `sink`.
    pub fn with_reload_sink(mut self, sink: Arc<dyn ReloadSink>) -> Self {
        self.reload = Some(sink);
        self
    }

    /// Bind `pattern` to `action`. Registering the same glob twice is a
    /// configuration error.
    pub fn register(&mut self, pattern: &str, action: Arc<dyn TransformUnit>) -> Result<()> {
        if self.bindings.iter().any(|b| b.pattern() == pattern) {
            return Err(AssetdagError::ConfigError(format!(
                "watch glob '{pattern}' is registered twice"
            )));
        }
        self.bindings.push(WatchBinding::new(pattern, action)?);
        Ok(())
    }

    pub fn bindings(&self) -> &[WatchBinding] {
        &self.bindings
    }

    pub fn debounce(&self) -> Duration {
        self.debounce
    }

    /// Directories the filesystem watcher must observe to see every binding.
    pub fn watch_roots(&self) -> Vec<PathBuf> {
        collapse_watch_roots(
            self.bindings
                .iter()
                .map(|b| watch_root_for(&self.root, b.pattern())),
        )
    }

    /// Spawn the per-binding workers. Must be called within a Tokio runtime.
    ///
    /// Workers stop once every clone of the returned handle is dropped.
    pub fn spawn(self) -> DispatchHandle {
        let (reports, _) = broadcast::channel(REPORT_CHANNEL_CAPACITY);
        let mut routes = Vec::with_capacity(self.bindings.len());

        let echo_window = (self.debounce * 4).max(MIN_ECHO_WINDOW);
        let ctx = Arc::new(WorkerContext {
            root: self.root.clone(),
            debounce: self.debounce,
            reload: self.reload,
            reports: reports.clone(),
            echoes: self
                .exclusive
                .then(|| Mutex::new(EchoLog::new(echo_window))),
        });

        for binding in self.bindings {
            let (tx, rx) = mpsc::unbounded_channel::<String>();
            routes.push(Route {
                pattern: binding.pattern().to_string(),
                matcher: binding.matcher().clone(),
                tx,
            });
            tokio::spawn(binding_worker(binding, rx, Arc::clone(&ctx)));
        }

        DispatchHandle {
            root: self.root,
            routes: Arc::new(routes),
            reports,
        }
    }

    /// Spawn the workers and a filesystem watcher feeding them.
    pub fn start(self) -> Result<(DispatchHandle, WatcherHandle)> {
        let roots = self.watch_roots();
        let handle = self.spawn();
        let watcher = spawn_watcher(roots, handle.clone())?;
        Ok((handle, watcher))
    }
}

struct Route {
    pattern: String,
    matcher: GlobMatcher,
    tx: mpsc::UnboundedSender<String>,
}

/// Entry point for change notifications; cheap to clone.
#[derive(Clone)]
pub struct DispatchHandle {
    root: PathBuf,
    routes: Arc<Vec<Route>>,
    reports: broadcast::Sender<WatchRunReport>,
}

impl std::fmt::Debug for DispatchHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DispatchHandle")
            .field("root", &self.root)
            .field(
                "patterns",
                &self.routes.iter().map(|r| &r.pattern).collect::<Vec<_>>(),
            )
            .finish()
    }
}

impl DispatchHandle {
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Route a change to `rel_path` (relative to the root, `/`-separated)
    /// to every binding whose glob matches it. Returns the number of
    /// bindings notified.
    pub fn dispatch(&self, rel_path: &str) -> usize {
        let mut notified = 0;
        for route in self.routes.iter() {
            if route.matcher.is_match(rel_path) && route.tx.send(rel_path.to_string()).is_ok() {
                debug!(path = rel_path, pattern = %route.pattern, "queued change");
                notified += 1;
            }
        }
        notified
    }

    /// Like [`DispatchHandle::dispatch`] for a path as reported by the
    /// filesystem watcher. Paths outside the root are ignored.
    pub fn dispatch_path(&self, path: &Path) -> usize {
        match relative_str(&self.root, path) {
            Some(rel) => self.dispatch(&rel),
            None => {
                debug!(?path, "change outside project root; ignoring");
                0
            }
        }
    }

    /// Receive a [`WatchRunReport`] after every re-run.
    pub fn subscribe(&self) -> broadcast::Receiver<WatchRunReport> {
        self.reports.subscribe()
    }
}

/// Outputs of recent exclusive runs, by path relative to the root.
#[derive(Debug)]
struct EchoLog {
    window: Duration,
    written: HashMap<String, Instant>,
}

impl EchoLog {
    fn new(window: Duration) -> Self {
        Self {
            window,
            written: HashMap::new(),
        }
    }

    fn record(&mut self, root: &Path, outputs: &[PathBuf], at: Instant) {
        for path in outputs {
            if let Some(rel) = relative_str(root, path) {
                self.written.insert(rel, at);
            }
        }
    }

    /// Drop the changes that are echoes of recent writes.
    fn filter(&mut self, changed: &mut Vec<String>, now: Instant) {
        let window = self.window;
        self.written.retain(|_, at| now.duration_since(*at) <= window);
        changed.retain(|path| !self.written.contains_key(path));
    }
}

/// State shared by every worker of one dispatcher.
struct WorkerContext {
    root: PathBuf,
    debounce: Duration,
    reload: Option<Arc<dyn ReloadSink>>,
    reports: broadcast::Sender<WatchRunReport>,
    /// Present in exclusive mode; held for the whole run.
    echoes: Option<Mutex<EchoLog>>,
}

async fn binding_worker(
    binding: WatchBinding,
    mut rx: mpsc::UnboundedReceiver<String>,
    ctx: Arc<WorkerContext>,
) {
    let action = TaskAction::Transform(Arc::clone(binding.action()));
    let action_name = binding.action().name().to_string();

    while let Some(first) = rx.recv().await {
        let mut changed = vec![first];
        let mut closed = false;

        // Trailing debounce: the window restarts on every new change.
        loop {
            match tokio::time::timeout(ctx.debounce, rx.recv()).await {
                Ok(Some(path)) => {
                    if !changed.contains(&path) {
                        changed.push(path);
                    }
                }
                Ok(None) => {
                    closed = true;
                    break;
                }
                Err(_) => break,
            }
        }

        let mut echoes = match &ctx.echoes {
            Some(log) => Some(log.lock().await),
            None => None,
        };
        if let Some(log) = echoes.as_mut() {
            log.filter(&mut changed, Instant::now());
            if changed.is_empty() {
                debug!(
                    pattern = binding.pattern(),
                    "only files written by a previous run changed; skipping"
                );
                if closed {
                    break;
                }
                continue;
            }
        }

        info!(
            pattern = binding.pattern(),
            action = %action_name,
            changed = ?changed,
            "change detected; re-running"
        );

        let report = match invoke_action(&action).await {
            TaskOutcome::Success(output) => {
                if let Some(log) = echoes.as_mut() {
                    log.record(&ctx.root, &output.written, Instant::now());
                }
                let reload = ctx
                    .reload
                    .as_ref()
                    .and_then(|sink| sink.outputs_changed(&output.written));
                info!(
                    action = %action_name,
                    written = output.written.len(),
                    reload = ?reload,
                    "re-run finished"
                );
                WatchRunReport {
                    pattern: binding.pattern().to_string(),
                    action: action_name.clone(),
                    changed,
                    result: Ok(output.written),
                    reload,
                }
            }
            TaskOutcome::Failed(message) => {
                error!(
                    action = %action_name,
                    error = %message,
                    "re-run failed; still watching"
                );
                WatchRunReport {
                    pattern: binding.pattern().to_string(),
                    action: action_name.clone(),
                    changed,
                    result: Err(message),
                    reload: None,
                }
            }
        };
        drop(echoes);

        // No subscribers is fine.
        let _ = ctx.reports.send(report);

        if closed {
            break;
        }
    }

    debug!(pattern = binding.pattern(), "watch worker finished");
}
