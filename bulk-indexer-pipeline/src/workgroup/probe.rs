//! Periodic external stop probe.

use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::info;

use crate::cancellation::StopHandle;

/// Interval between two probe calls unless configured otherwise.
pub const DEFAULT_PROBE_INTERVAL: Duration = Duration::from_secs(5);

/// External "should we stop" check.
pub type StopProbe = Arc<dyn Fn() -> bool + Send + Sync>;

/// Background task polling a probe; aborted when dropped.
pub(crate) struct ProbeGuard {
    handle: JoinHandle<()>,
}

impl ProbeGuard {
    pub(crate) fn spawn(probe: StopProbe, interval: Duration, stop: StopHandle) -> Self {
        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            // The first tick completes immediately.
            ticker.tick().await;

            while !stop.should_stop() {
                ticker.tick().await;
                if probe() {
                    info!("Stop probe requested a stop");
                    stop.request_stop();
                }
            }
        });

        Self { handle }
    }
}

impl Drop for ProbeGuard {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[tokio::test(start_paused = true)]
    async fn test_probe_raises_stop() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        let probe: StopProbe = Arc::new(move || counter.fetch_add(1, Ordering::SeqCst) >= 2);
        let stop = StopHandle::new();

        let _guard = ProbeGuard::spawn(probe, DEFAULT_PROBE_INTERVAL, stop.clone());

        tokio::time::sleep(Duration::from_secs(11)).await;
        assert!(!stop.should_stop());

        tokio::time::sleep(Duration::from_secs(5)).await;
        assert!(stop.should_stop());
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_dropping_guard_stops_polling() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        let probe: StopProbe = Arc::new(move || {
            counter.fetch_add(1, Ordering::SeqCst);
            false
        });

        let guard = ProbeGuard::spawn(probe, Duration::from_secs(1), StopHandle::new());
        tokio::time::sleep(Duration::from_millis(2500)).await;
        drop(guard);
        let seen = calls.load(Ordering::SeqCst);

        tokio::time::sleep(Duration::from_secs(10)).await;
        assert_eq!(calls.load(Ordering::SeqCst), seen);
    }
}
