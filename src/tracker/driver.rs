//! Async tick driver
//!
//! Calls [`SampleTracker::advance`] on a fixed interval until cancelled.
//! The interval wait sits in `tokio::select!` against the cancellation
//! token, so shutdown is immediate.

use std::sync::Arc;
use std::time::Duration;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use super::SampleTracker;

/// Drive the tracker until `cancel` fires. Returns the number of ticks run.
pub async fn run_tick_driver(
    tracker: Arc<SampleTracker>,
    interval: Duration,
    cancel: CancellationToken,
) -> u64 {
    let mut ticker = tokio::time::interval(interval);
    // A stalled runtime should not replay a burst of ticks; advance() already
    // covers the whole gap from the clock.
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    info!(interval_ms = interval.as_millis() as u64, "Tracker tick driver started");
    let mut ticks: u64 = 0;

    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                info!(ticks, "Tracker tick driver shutting down");
                break;
            }
            _ = ticker.tick() => {
                let completed = tracker.advance();
                ticks += 1;
                if !completed.is_empty() {
                    debug!(completed = completed.len(), running = tracker.running_count(), "Tick completed samples");
                }
            }
        }
    }

    ticks
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TrackerConfig;
    use crate::tracker::{ManualClock, SystemClock};

    #[tokio::test]
    async fn test_driver_stops_on_cancel() {
        let tracker = Arc::new(SampleTracker::new(TrackerConfig::default(), Arc::new(ManualClock::default())));
        let cancel = CancellationToken::new();
        let handle = tokio::spawn(run_tick_driver(tracker, Duration::from_millis(5), cancel.clone()));

        tokio::time::sleep(Duration::from_millis(30)).await;
        cancel.cancel();

        let ticks = tokio::time::timeout(Duration::from_secs(1), handle)
            .await
            .expect("driver should exit promptly")
            .unwrap();
        assert!(ticks >= 1);
    }

    #[tokio::test]
    async fn test_already_cancelled_exits_without_waiting() {
        let tracker = Arc::new(SampleTracker::with_system_clock(TrackerConfig::default()));
        let cancel = CancellationToken::new();
        cancel.cancel();
        let ticks = tokio::time::timeout(
            Duration::from_secs(1),
            run_tick_driver(tracker, Duration::from_secs(3600), cancel),
        )
        .await
        .expect("cancelled driver must not wait for the interval");
        // select! may pick the immediate first tick or the cancel branch
        assert!(ticks <= 1);
    }

    #[tokio::test]
    async fn test_driver_counts_samples_down() {
        let tracker = Arc::new(SampleTracker::new(TrackerConfig::default(), Arc::new(SystemClock)));
        tracker.start("A", 0.05).unwrap();
        let cancel = CancellationToken::new();
        let handle = tokio::spawn(run_tick_driver(tracker.clone(), Duration::from_millis(10), cancel.clone()));

        tokio::time::sleep(Duration::from_millis(200)).await;
        cancel.cancel();
        handle.await.unwrap();

        assert!(!tracker.get("A").unwrap().is_running());
    }
}
