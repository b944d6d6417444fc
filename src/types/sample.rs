//! Tracked cuttings samples: per-sample countdown state

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Lifecycle of a tracked sample. `Completed` is terminal.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum SampleStatus {
    #[default]
    Running,
    Completed,
}

impl std::fmt::Display for SampleStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SampleStatus::Running => write!(f, "Running"),
            SampleStatus::Completed => write!(f, "Completed"),
        }
    }
}

/// How remaining time is recomputed when live pump speed changes.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum RescalePolicy {
    /// Keep the travelled fraction of the annulus; remaining volume over new output
    #[default]
    Proportional,
    /// Restart the countdown from the new lag time
    Reset,
}

impl std::str::FromStr for RescalePolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "proportional" => Ok(RescalePolicy::Proportional),
            "reset" => Ok(RescalePolicy::Reset),
            other => Err(format!("unknown rescale policy '{other}'")),
        }
    }
}

/// One sample travelling up the annulus.
///
/// Invariant: `0 <= remaining_time_seconds <= lag_time_seconds`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackedSample {
    pub name: String,
    /// Target bottoms-up duration (s)
    pub lag_time_seconds: f64,
    pub remaining_time_seconds: f64,
    pub status: SampleStatus,
    pub created_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl TrackedSample {
    pub fn new(name: impl Into<String>, lag_time_seconds: f64, created_at: DateTime<Utc>) -> Self {
        Self {
            name: name.into(),
            lag_time_seconds,
            remaining_time_seconds: lag_time_seconds,
            status: SampleStatus::Running,
            created_at,
            completed_at: None,
        }
    }

    pub fn is_running(&self) -> bool {
        self.status == SampleStatus::Running
    }

    /// Seconds already travelled.
    pub fn elapsed_seconds(&self) -> f64 {
        self.lag_time_seconds - self.remaining_time_seconds
    }

    /// Fraction of the trip completed, 0.0 to 1.0.
    pub fn progress(&self) -> f64 {
        if self.lag_time_seconds <= 0.0 {
            return 1.0;
        }
        (self.elapsed_seconds() / self.lag_time_seconds).clamp(0.0, 1.0)
    }

    /// Count down by `elapsed_seconds`, floored at zero.
    ///
    /// Returns true only on the call that moves the sample to `Completed`.
    pub fn advance(&mut self, elapsed_seconds: f64, now: DateTime<Utc>) -> bool {
        if !self.is_running() {
            return false;
        }
        self.remaining_time_seconds = (self.remaining_time_seconds - elapsed_seconds).max(0.0);
        if self.remaining_time_seconds <= 0.0 {
            self.remaining_time_seconds = 0.0;
            self.status = SampleStatus::Completed;
            self.completed_at = Some(now);
            return true;
        }
        false
    }

    /// Apply a new lag time after a pump speed change. No-op once completed.
    pub fn rescale(&mut self, new_lag_time_seconds: f64, policy: RescalePolicy) {
        if !self.is_running() {
            return;
        }
        let remaining = match policy {
            RescalePolicy::Proportional => {
                let fraction_left = if self.lag_time_seconds > 0.0 {
                    self.remaining_time_seconds / self.lag_time_seconds
                } else {
                    1.0
                };
                fraction_left * new_lag_time_seconds
            }
            RescalePolicy::Reset => new_lag_time_seconds,
        };
        self.lag_time_seconds = new_lag_time_seconds;
        self.remaining_time_seconds = remaining.clamp(0.0, new_lag_time_seconds);
    }
}
