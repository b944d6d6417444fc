//! Sample registry behind a single RwLock

use chrono::{DateTime, Duration, Utc};
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};
use tracing::{debug, info, warn};

use super::{Clock, SystemClock, TrackerError};
use crate::config::TrackerConfig;
use crate::types::{RescalePolicy, TrackedSample};

#[derive(Debug)]
struct Entry {
    sample: TrackedSample,
    /// Clock instant up to which this sample's travel has been counted.
    /// Starts at `created_at`; `tick` moves it by the ticked amount and
    /// `advance` moves it to the clock's now.
    accounted_to: DateTime<Utc>,
}

#[derive(Debug, Default)]
struct Registry {
    /// Insertion order; snapshot sorts by `created_at` with a stable sort
    entries: Vec<Entry>,
}

impl Registry {
    fn position(&self, name: &str) -> Option<usize> {
        self.entries.iter().position(|e| e.sample.name == name)
    }
}

/// Registry of named samples and their countdowns.
///
/// Every mutation takes the write lock for its whole duration, so a tick is
/// applied to all running samples atomically with respect to `start`,
/// `rescale` and `stop`.
pub struct SampleTracker {
    registry: RwLock<Registry>,
    config: TrackerConfig,
    clock: Arc<dyn Clock>,
}

fn valid_duration(seconds: f64) -> Result<f64, TrackerError> {
    if seconds.is_finite() && seconds > 0.0 {
        Ok(seconds)
    } else {
        Err(TrackerError::InvalidDuration(seconds))
    }
}

impl SampleTracker {
    pub fn new(config: TrackerConfig, clock: Arc<dyn Clock>) -> Self {
        Self {
            registry: RwLock::new(Registry::default()),
            config,
            clock,
        }
    }

    /// Tracker on the wall clock.
    pub fn with_system_clock(config: TrackerConfig) -> Self {
        Self::new(config, Arc::new(SystemClock))
    }

    pub fn config(&self) -> &TrackerConfig {
        &self.config
    }

    pub fn rescale_policy(&self) -> RescalePolicy {
        self.config.rescale_policy
    }

    fn read(&self) -> RwLockReadGuard<'_, Registry> {
        self.registry.read().unwrap_or_else(|e| {
            warn!("RwLock poisoned on SampleTracker read, recovering");
            e.into_inner()
        })
    }

    fn write(&self) -> RwLockWriteGuard<'_, Registry> {
        self.registry.write().unwrap_or_else(|e| {
            warn!("RwLock poisoned on SampleTracker write, recovering");
            e.into_inner()
        })
    }

    /// Start a countdown for `name`.
    ///
    /// A completed sample with the same name is replaced; a running one is
    /// rejected with [`TrackerError::DuplicateName`].
    pub fn start(&self, name: &str, lag_time_seconds: f64) -> Result<TrackedSample, TrackerError> {
        let lag_time_seconds = valid_duration(lag_time_seconds)?;
        let now = self.clock.now();
        let mut reg = self.write();

        if let Some(idx) = reg.position(name) {
            if reg.entries[idx].sample.is_running() {
                return Err(TrackerError::DuplicateName(name.to_string()));
            }
            reg.entries.remove(idx);
        }

        let sample = TrackedSample::new(name, lag_time_seconds, now);
        reg.entries.push(Entry {
            sample: sample.clone(),
            accounted_to: now,
        });
        info!(sample = %name, lag_time_seconds, "Sample tracking started");
        Ok(sample)
    }

    /// Count every running sample down by `elapsed_seconds`.
    ///
    /// The ticked amount also counts against the clock, so a later
    /// [`advance`](Self::advance) only charges time the ticks have not
    /// already covered. Returns the samples that completed on this tick.
    /// Negative or non-finite amounts are ignored.
    pub fn tick(&self, elapsed_seconds: f64) -> Vec<TrackedSample> {
        if !elapsed_seconds.is_finite() || elapsed_seconds < 0.0 {
            warn!(elapsed_seconds, "Ignoring invalid tick amount");
            return Vec::new();
        }
        let now = self.clock.now();
        let step = Duration::nanoseconds((elapsed_seconds * 1e9).round() as i64);
        let mut reg = self.write();
        self.apply(&mut reg, now, |entry| {
            if let Some(next) = entry.accounted_to.checked_add_signed(step) {
                entry.accounted_to = next;
            }
            elapsed_seconds
        })
    }

    /// Tick each running sample by the clock time since its own last count.
    ///
    /// A sample started between two advances is charged only from its
    /// `created_at`. When earlier ticks already ran ahead of the clock the
    /// sample is left alone until the clock catches up.
    pub fn advance(&self) -> Vec<TrackedSample> {
        let now = self.clock.now();
        let mut reg = self.write();
        self.apply(&mut reg, now, |entry| match (now - entry.accounted_to).to_std() {
            Ok(delta) => {
                entry.accounted_to = now;
                delta.as_secs_f64()
            }
            Err(_) => 0.0,
        })
    }

    /// Run `elapsed_for` on every running entry and count it down by the
    /// amount returned.
    fn apply(
        &self,
        reg: &mut Registry,
        now: DateTime<Utc>,
        mut elapsed_for: impl FnMut(&mut Entry) -> f64,
    ) -> Vec<TrackedSample> {
        let mut completed = Vec::new();
        for entry in reg.entries.iter_mut().filter(|e| e.sample.is_running()) {
            let elapsed_seconds = elapsed_for(entry);
            if elapsed_seconds <= 0.0 {
                continue;
            }
            let sample = &mut entry.sample;
            if sample.advance(elapsed_seconds, now) {
                info!(sample = %sample.name, lag_time_seconds = sample.lag_time_seconds, "Sample reached surface");
                completed.push(sample.clone());
            }
        }

        if !self.config.retain_completed && !completed.is_empty() {
            reg.entries.retain(|e| e.sample.is_running());
        }
        completed
    }

    /// Apply a new lag time to `name` using the configured policy.
    ///
    /// A completed sample is returned unchanged.
    pub fn rescale(&self, name: &str, new_lag_time_seconds: f64) -> Result<TrackedSample, TrackerError> {
        let new_lag_time_seconds = valid_duration(new_lag_time_seconds)?;
        let policy = self.config.rescale_policy;
        let mut reg = self.write();
        let idx = reg
            .position(name)
            .ok_or_else(|| TrackerError::NotFound(name.to_string()))?;

        let sample = &mut reg.entries[idx].sample;
        let old_lag = sample.lag_time_seconds;
        sample.rescale(new_lag_time_seconds, policy);
        debug!(
            sample = %name,
            old_lag_seconds = old_lag,
            new_lag_seconds = sample.lag_time_seconds,
            remaining_seconds = sample.remaining_time_seconds,
            ?policy,
            "Sample rescaled"
        );
        Ok(sample.clone())
    }

    /// Remove `name` from the registry. Other samples are untouched.
    pub fn stop(&self, name: &str) -> Result<TrackedSample, TrackerError> {
        let mut reg = self.write();
        let idx = reg
            .position(name)
            .ok_or_else(|| TrackerError::NotFound(name.to_string()))?;
        let removed = reg.entries.remove(idx).sample;
        info!(sample = %name, remaining_seconds = removed.remaining_time_seconds, "Sample tracking stopped");
        Ok(removed)
    }

    /// Drop all completed samples. Returns how many were removed.
    pub fn clear_completed(&self) -> usize {
        let mut reg = self.write();
        let before = reg.entries.len();
        reg.entries.retain(|e| e.sample.is_running());
        before - reg.entries.len()
    }

    pub fn get(&self, name: &str) -> Option<TrackedSample> {
        let reg = self.read();
        reg.position(name).map(|idx| reg.entries[idx].sample.clone())
    }

    /// All samples, oldest first.
    pub fn snapshot(&self) -> Vec<TrackedSample> {
        let mut samples: Vec<TrackedSample> = self.read().entries.iter().map(|e| e.sample.clone()).collect();
        samples.sort_by_key(|s| s.created_at);
        samples
    }

    pub fn running_count(&self) -> usize {
        self.read().entries.iter().filter(|e| e.sample.is_running()).count()
    }

    pub fn len(&self) -> usize {
        self.read().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl std::fmt::Debug for SampleTracker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SampleTracker")
            .field("samples", &self.len())
            .field("config", &self.config)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tracker::ManualClock;
    use crate::types::SampleStatus;

    fn tracker_with(config: TrackerConfig) -> (SampleTracker, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::default());
        (SampleTracker::new(config, clock.clone()), clock)
    }

    fn tracker() -> (SampleTracker, Arc<ManualClock>) {
        tracker_with(TrackerConfig::default())
    }

    #[test]
    fn test_countdown_to_completion() {
        let (t, _) = tracker();
        t.start("A", 100.0).unwrap();

        t.tick(30.0);
        let a = t.get("A").unwrap();
        assert_eq!(a.remaining_time_seconds, 70.0);
        assert_eq!(a.status, SampleStatus::Running);

        t.tick(30.0);
        t.tick(30.0);
        let done = t.tick(30.0);
        assert_eq!(done.len(), 1);
        let a = t.get("A").unwrap();
        assert_eq!(a.remaining_time_seconds, 0.0);
        assert_eq!(a.status, SampleStatus::Completed);

        // Terminal: further ticks change nothing and report nothing
        assert!(t.tick(30.0).is_empty());
        assert_eq!(t.get("A").unwrap(), a);
    }

    #[test]
    fn test_duplicate_running_name_rejected() {
        let (t, _) = tracker();
        t.start("A", 100.0).unwrap();
        assert_eq!(t.start("A", 50.0), Err(TrackerError::DuplicateName("A".to_string())));
        assert_eq!(t.get("A").unwrap().lag_time_seconds, 100.0);
    }

    #[test]
    fn test_completed_name_can_be_reused() {
        let (t, _) = tracker();
        t.start("A", 10.0).unwrap();
        t.tick(10.0);
        let fresh = t.start("A", 40.0).unwrap();
        assert_eq!(fresh.status, SampleStatus::Running);
        assert_eq!(t.len(), 1);
        assert_eq!(t.get("A").unwrap().remaining_time_seconds, 40.0);
    }

    #[test]
    fn test_invalid_durations_rejected() {
        let (t, _) = tracker();
        assert!(matches!(t.start("A", 0.0), Err(TrackerError::InvalidDuration(_))));
        assert!(matches!(t.start("A", -5.0), Err(TrackerError::InvalidDuration(_))));
        assert!(matches!(t.start("A", f64::NAN), Err(TrackerError::InvalidDuration(_))));
        assert!(t.is_empty());
    }

    #[test]
    fn test_invalid_tick_ignored() {
        let (t, _) = tracker();
        t.start("A", 100.0).unwrap();
        t.tick(-10.0);
        t.tick(f64::INFINITY);
        assert_eq!(t.get("A").unwrap().remaining_time_seconds, 100.0);
    }

    #[test]
    fn test_tick_applies_to_all_running() {
        let (t, _) = tracker();
        t.start("A", 100.0).unwrap();
        t.start("B", 40.0).unwrap();
        let done = t.tick(50.0);
        assert_eq!(done.iter().map(|s| s.name.as_str()).collect::<Vec<_>>(), vec!["B"]);
        assert_eq!(t.get("A").unwrap().remaining_time_seconds, 50.0);
        assert_eq!(t.running_count(), 1);
    }

    #[test]
    fn test_rescale_proportional() {
        let (t, _) = tracker();
        t.start("A", 100.0).unwrap();
        t.tick(25.0);
        // 75% of the annulus left, new lag 200 s
        let s = t.rescale("A", 200.0).unwrap();
        assert_eq!(s.lag_time_seconds, 200.0);
        assert!((s.remaining_time_seconds - 150.0).abs() < 1e-9);
    }

    #[test]
    fn test_rescale_reset() {
        let (t, _) = tracker_with(TrackerConfig {
            rescale_policy: RescalePolicy::Reset,
            ..TrackerConfig::default()
        });
        t.start("A", 100.0).unwrap();
        t.tick(25.0);
        let s = t.rescale("A", 60.0).unwrap();
        assert_eq!(s.remaining_time_seconds, 60.0);
        assert_eq!(s.lag_time_seconds, 60.0);
    }

    #[test]
    fn test_rescale_missing_and_completed() {
        let (t, _) = tracker();
        assert_eq!(t.rescale("X", 10.0), Err(TrackerError::NotFound("X".to_string())));

        t.start("A", 10.0).unwrap();
        t.tick(10.0);
        let before = t.get("A").unwrap();
        let after = t.rescale("A", 500.0).unwrap();
        assert_eq!(before, after);
    }

    #[test]
    fn test_stop_leaves_others_running() {
        let (t, _) = tracker();
        t.start("A", 100.0).unwrap();
        t.start("B", 100.0).unwrap();
        t.stop("A").unwrap();
        assert!(t.get("A").is_none());
        assert!(t.get("B").unwrap().is_running());
        assert_eq!(t.stop("A"), Err(TrackerError::NotFound("A".to_string())));
    }

    #[test]
    fn test_clear_completed() {
        let (t, _) = tracker();
        t.start("A", 10.0).unwrap();
        t.start("B", 100.0).unwrap();
        t.tick(20.0);
        assert_eq!(t.clear_completed(), 1);
        assert_eq!(t.len(), 1);
        assert!(t.get("B").is_some());
    }

    #[test]
    fn test_not_retaining_completed_drops_on_completion() {
        let (t, _) = tracker_with(TrackerConfig {
            retain_completed: false,
            ..TrackerConfig::default()
        });
        t.start("A", 10.0).unwrap();
        let done = t.tick(15.0);
        assert_eq!(done.len(), 1);
        assert!(t.is_empty());
    }

    #[test]
    fn test_advance_uses_clock() {
        let (t, clock) = tracker();
        t.start("A", 60.0).unwrap();
        clock.advance_secs(20);
        t.advance();
        assert_eq!(t.get("A").unwrap().remaining_time_seconds, 40.0);

        // Without the clock moving, advance does nothing
        t.advance();
        assert_eq!(t.get("A").unwrap().remaining_time_seconds, 40.0);

        clock.advance_ms(40_000);
        let done = t.advance();
        assert_eq!(done.len(), 1);
        assert_eq!(t.get("A").unwrap().completed_at, Some(clock.now()));
    }

    #[test]
    fn test_sample_started_between_advances_keeps_full_lag() {
        let (t, clock) = tracker();
        t.start("early", 100.0).unwrap();
        clock.advance_secs(20);
        t.start("A", 60.0).unwrap();

        t.advance();
        assert_eq!(t.get("A").unwrap().remaining_time_seconds, 60.0);
        assert_eq!(t.get("early").unwrap().remaining_time_seconds, 80.0);

        clock.advance_secs(15);
        t.advance();
        assert_eq!(t.get("A").unwrap().remaining_time_seconds, 45.0);
        assert_eq!(t.get("early").unwrap().remaining_time_seconds, 65.0);
    }

    #[test]
    fn test_tick_and_advance_count_time_once() {
        let (t, clock) = tracker();
        t.start("A", 100.0).unwrap();
        clock.advance_secs(10);
        t.tick(10.0);
        t.advance();
        assert_eq!(t.get("A").unwrap().remaining_time_seconds, 90.0);

        // Ticks ahead of the clock hold off advance until it catches up
        t.tick(5.0);
        clock.advance_secs(3);
        t.advance();
        assert_eq!(t.get("A").unwrap().remaining_time_seconds, 85.0);
        clock.advance_secs(4);
        t.advance();
        assert_eq!(t.get("A").unwrap().remaining_time_seconds, 83.0);
    }

    #[test]
    fn test_advance_keeps_sub_millisecond_time() {
        let (t, clock) = tracker();
        t.start("A", 100.0).unwrap();
        for _ in 0..1_000 {
            clock.advance_by(chrono::Duration::microseconds(999));
            t.advance();
        }
        let remaining = t.get("A").unwrap().remaining_time_seconds;
        assert!((remaining - 99.001).abs() < 1e-9, "remaining = {remaining}");
    }

    #[test]
    fn test_snapshot_sorted_by_creation() {
        let (t, clock) = tracker();
        t.start("late", 100.0).unwrap();
        clock.advance_secs(5);
        t.start("later", 100.0).unwrap();
        clock.advance_secs(5);
        t.start("latest", 100.0).unwrap();

        let names: Vec<String> = t.snapshot().into_iter().map(|s| s.name).collect();
        assert_eq!(names, vec!["late", "later", "latest"]);
    }

    #[test]
    fn test_remaining_never_exceeds_lag() {
        let (t, _) = tracker();
        t.start("A", 90.0).unwrap();
        for step in [0.0, 7.5, 12.0, 33.3, 50.0] {
            t.tick(step);
            let s = t.get("A").unwrap();
            assert!(s.remaining_time_seconds >= 0.0);
            assert!(s.remaining_time_seconds <= s.lag_time_seconds);
        }
    }
}
