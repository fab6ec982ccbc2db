//! Credential file watcher.

use std::future::Future;
use std::path::{Path, PathBuf};
use std::time::Duration;

use notify::{Config, Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::{mpsc, oneshot};

use crate::error::BridgeError;
use crate::observability::metrics;

/// Shortest settle window; the raw events of one rename arrive within it.
pub const MIN_SETTLE: Duration = Duration::from_millis(50);

/// Watches one file and runs a callback whenever its content is replaced.
#[derive(Debug, Clone)]
pub struct RotationWatcher {
    path: PathBuf,
    settle: Duration,
}

impl RotationWatcher {
    /// `settle` below [`MIN_SETTLE`] is raised to it.
    pub fn new(path: impl Into<PathBuf>, settle: Duration) -> Self {
        Self {
            path: path.into(),
            settle: settle.max(MIN_SETTLE),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Watch until the backend fails or `on_change` returns an error.
    ///
    /// `ready` fires once interest in the path is registered and before the
    /// first wait for events. It is dropped unsent if registration fails.
    pub async fn watch<F, Fut>(
        self,
        ready: oneshot::Sender<()>,
        mut on_change: F,
    ) -> Result<(), BridgeError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<(), BridgeError>>,
    {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut watcher = RecommendedWatcher::new(
            move |res: notify::Result<Event>| {
                let _ = tx.send(res);
            },
            Config::default(),
        )
        .map_err(|e| self.watch_error(e))?;

        watcher
            .watch(&self.path, RecursiveMode::NonRecursive)
            .map_err(|e| self.watch_error(e))?;

        tracing::info!(path = %self.path.display(), "Rotation watcher started");
        let _ = ready.send(());

        loop {
            let event = match rx.recv().await {
                Some(Ok(event)) => event,
                Some(Err(e)) => return Err(self.watch_error(e)),
                None => return Err(BridgeError::WatchClosed { path: self.path.clone() }),
            };
            if !is_change(&event.kind) {
                continue;
            }
            tracing::debug!(path = %self.path.display(), kind = ?event.kind, "Change event");

            // One replace shows up as several raw events; fold them into one.
            tokio::time::sleep(self.settle).await;
            while let Ok(queued) = rx.try_recv() {
                if let Err(e) = queued {
                    return Err(self.watch_error(e));
                }
            }

            self.rearm(&mut watcher)?;

            if !self.has_content().await? {
                tracing::info!(
                    path = %self.path.display(),
                    "Detected change was a false alarm (empty file), ignoring"
                );
                metrics::record_false_alarm(&self.label());
                continue;
            }

            tracing::info!(path = %self.path.display(), "Detected change in credential file");
            metrics::record_rotation(&self.label());
            on_change().await?;
        }
    }

    /// Re-register interest in the path. A rename-based replace leaves the
    /// old registration pointing at the unlinked inode.
    fn rearm(&self, watcher: &mut RecommendedWatcher) -> Result<(), BridgeError> {
        // The backend may already have dropped the old registration.
        let _ = watcher.unwatch(&self.path);
        watcher
            .watch(&self.path, RecursiveMode::NonRecursive)
            .map_err(|e| self.watch_error(e))
    }

    async fn has_content(&self) -> Result<bool, BridgeError> {
        let meta = tokio::fs::metadata(&self.path)
            .await
            .map_err(|source| BridgeError::Read {
                what: "watched file metadata",
                path: self.path.clone(),
                source,
            })?;
        Ok(meta.len() >= 1)
    }

    fn label(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default()
    }

    fn watch_error(&self, source: notify::Error) -> BridgeError {
        BridgeError::Watch {
            path: self.path.clone(),
            source,
        }
    }
}

/// Create, write, remove, rename and permission changes all count; reads do not.
fn is_change(kind: &EventKind) -> bool {
    !matches!(kind, EventKind::Access(_))
}
