//! Startup ordering.
//!
//! # Responsibilities
//! - Hold the launch back until every watcher has registered its watch
//!
//! # Design Decisions
//! - Each watcher owns one oneshot sender; the barrier awaits all receivers
//! - A sender dropped unsent means its watcher failed before registering;
//!   the barrier then never opens and the watcher's error wins the fan-in

use std::future::Future;

use tokio::sync::oneshot;

/// Await every readiness signal, then run `launch`.
pub async fn launch_when_ready<F, T>(ready: Vec<oneshot::Receiver<()>>, launch: F) -> T
where
    F: Future<Output = T>,
{
    let expected = ready.len();
    for rx in ready {
        if rx.await.is_err() {
            tracing::debug!("Watcher exited before signalling readiness, holding launch");
            std::future::pending::<()>().await;
        }
    }
    tracing::debug!(watchers = expected, "All watchers ready");
    launch.await
}
