//! Document watcher: polls a document's remote source and rebases onto
//! updates.
//!
//! The watcher is an explicit scheduler, not a reactivity hook: its
//! desired state is a plain function of two document fields (a source URL
//! being present, the watch-mode flag being on), recomputed whenever
//! [`DocumentWatcher::sync`] is called. The polling loop is single-flight;
//! the next tick is scheduled only after the current one fully resolves,
//! so no two polls for the same document ever overlap.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use oas_json::json_clone::clone;
use serde_json::Value;
use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::rebase::{
    describe_conflict, parse_document_body, rebase, ConflictPolicy, RebaseError, RemoteSource,
};
use crate::store::Workspace;

/// Poll timing. Failures double the timeout up to the maximum; any
/// successful tick (including "nothing changed") resets it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WatchConfig {
    pub initial_timeout: Duration,
    pub max_timeout: Duration,
}

impl Default for WatchConfig {
    fn default() -> Self {
        WatchConfig {
            initial_timeout: Duration::from_millis(5000),
            max_timeout: Duration::from_millis(60_000),
        }
    }
}

/// Polls one document by name.
///
/// Holds only a name-based relation to the workspace, never the documents
/// themselves. Dropping the watcher (or calling [`stop`](Self::stop))
/// cancels the pending timer; an already-issued fetch is allowed to finish
/// but its result is discarded.
pub struct DocumentWatcher {
    workspace: Arc<Mutex<Workspace>>,
    document: String,
    source: Arc<dyn RemoteSource>,
    config: WatchConfig,
    policy: ConflictPolicy,
    running: Option<(watch::Sender<bool>, JoinHandle<()>)>,
}

impl DocumentWatcher {
    pub fn new(
        workspace: Arc<Mutex<Workspace>>,
        document: impl Into<String>,
        source: Arc<dyn RemoteSource>,
    ) -> Self {
        DocumentWatcher {
            workspace,
            document: document.into(),
            source,
            config: WatchConfig::default(),
            policy: ConflictPolicy::PreferRemote,
            running: None,
        }
    }

    pub fn with_config(mut self, config: WatchConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_policy(mut self, policy: ConflictPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn is_watching(&self) -> bool {
        self.running.is_some()
    }

    /// Recompute desired state from the watched document and start or
    /// stop the loop accordingly. Call after any change to the document's
    /// source URL or watch-mode flag.
    ///
    /// Stopping resets backoff; a later start begins at the initial
    /// timeout again.
    pub fn sync(&mut self) {
        let desired = {
            let ws = self.workspace.lock().unwrap();
            ws.document(&self.document)
                .map(|doc| doc.source_url().is_some() && doc.watch_mode())
                .unwrap_or(false)
        };
        match (desired, self.running.is_some()) {
            (true, false) => self.start(),
            (false, true) => self.stop(),
            _ => {}
        }
    }

    /// Cancel the pending timer and end the loop. Idempotent.
    pub fn stop(&mut self) {
        if let Some((shutdown, _task)) = self.running.take() {
            // The loop observes the flag at its next suspension point; a
            // sleeping timer wakes immediately.
            let _ = shutdown.send(true);
        }
    }

    fn start(&mut self) {
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let workspace = Arc::clone(&self.workspace);
        let source = Arc::clone(&self.source);
        let document = self.document.clone();
        let config = self.config;
        let policy = self.policy;

        let task = tokio::spawn(async move {
            run_poll_loop(workspace, document, source, config, policy, shutdown_rx).await;
        });
        self.running = Some((shutdown_tx, task));
    }
}

impl Drop for DocumentWatcher {
    fn drop(&mut self) {
        self.stop();
    }
}

async fn run_poll_loop(
    workspace: Arc<Mutex<Workspace>>,
    document: String,
    source: Arc<dyn RemoteSource>,
    config: WatchConfig,
    policy: ConflictPolicy,
    mut shutdown: watch::Receiver<bool>,
) {
    let mut timeout = config.initial_timeout;
    loop {
        tokio::select! {
            _ = tokio::time::sleep(timeout) => {}
            _ = shutdown.changed() => {}
        }
        if *shutdown.borrow() {
            break;
        }

        match poll_once(&workspace, &document, source.as_ref(), policy, &shutdown).await {
            Ok(()) | Err(RebaseError::NoChangesDetected) => {
                timeout = config.initial_timeout;
            }
            Err(err) => {
                timeout = (timeout * 2).min(config.max_timeout);
                tracing::warn!(
                    document = %document,
                    error = %err,
                    next_poll_ms = timeout.as_millis() as u64,
                    "document poll failed, backing off"
                );
            }
        }

        if *shutdown.borrow() {
            break;
        }
    }
}

/// One tick: fetch, parse, rebase, commit.
async fn poll_once(
    workspace: &Arc<Mutex<Workspace>>,
    document: &str,
    source: &dyn RemoteSource,
    policy: ConflictPolicy,
    shutdown: &watch::Receiver<bool>,
) -> Result<(), RebaseError> {
    let (url, base, local) = {
        let ws = workspace.lock().unwrap();
        let doc = ws
            .document(document)
            .ok_or_else(|| RebaseError::UnknownDocument(document.to_string()))?;
        let url = doc
            .source_url()
            .ok_or_else(|| RebaseError::Fetch("missing source url".to_string()))?;
        (url, clone(doc.snapshot()), clone(doc.content()))
    };

    let body = source
        .fetch(&url)
        .await
        .map_err(|e| RebaseError::Fetch(e.0))?;
    let remote: Value = parse_document_body(&body).map_err(RebaseError::Parse)?;

    // Teardown requested while the fetch was in flight: discard.
    if *shutdown.borrow() {
        return Ok(());
    }

    let rb = rebase(&base, &local, &remote)?;
    for conflict in &rb.conflicts {
        tracing::debug!(
            document = %document,
            conflict = %describe_conflict(conflict),
            "resolving conflict by policy"
        );
    }
    let commit = rb.resolve(policy)?;

    let mut ws = workspace.lock().unwrap();
    ws.commit_rebase(document, commit)?;
    tracing::debug!(document = %document, "rebased onto remote update");
    Ok(())
}
