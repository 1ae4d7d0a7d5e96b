//! Periodic keep-alive while a run is `running` or `paused`, so the host
//! runtime doesn't evict an idle-looking service worker mid-run. Modeled
//! on the teacher's `tokio::time::interval` background-task shape in
//! `main.rs` (kill-switch polling loops), minus any kill-switch logic —
//! this loop only ever stops itself.

use crate::models::RunStatus;
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::debug;

/// Spawns a background tick loop that calls `on_tick` at `interval`
/// while `status` reads `running`/`paused`, and exits on its own once
/// the run reaches any terminal-ish status.
pub fn spawn_keepalive(
    status: Arc<Mutex<RunStatus>>,
    interval: Duration,
    mut on_tick: impl FnMut() + Send + 'static,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        ticker.tick().await; // first tick fires immediately; discard it
        loop {
            ticker.tick().await;
            let current = *status.lock();
            if !matches!(current, RunStatus::Running | RunStatus::Paused) {
                debug!(?current, "keep-alive stopping, run reached a terminal status");
                break;
            }
            on_tick();
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[tokio::test(start_paused = true)]
    async fn ticks_while_running_and_stops_on_completion() {
        let status = Arc::new(Mutex::new(RunStatus::Running));
        let ticks = Arc::new(AtomicUsize::new(0));
        let ticks_clone = ticks.clone();

        let handle = spawn_keepalive(status.clone(), Duration::from_millis(10), move || {
            ticks_clone.fetch_add(1, Ordering::SeqCst);
        });

        tokio::time::advance(Duration::from_millis(35)).await;
        assert!(ticks.load(Ordering::SeqCst) >= 2);

        *status.lock() = RunStatus::Complete;
        tokio::time::advance(Duration::from_millis(20)).await;

        handle.await.unwrap();
    }
}
