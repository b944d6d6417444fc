//! Live Sample Tracker
//!
//! Named countdowns for cuttings samples travelling up the annulus. Time
//! passes in two ways: `tick(elapsed)` counts down by an explicit amount,
//! and `advance()` counts down by what the injected [`Clock`] says has
//! passed for each sample since its own last count. The async driver in
//! [`driver`] calls `advance()` from a tokio interval in production.
//!
//! Both paths share each sample's counted-to instant, so mixing them never
//! charges the same time twice. Nothing in here reads the wall clock
//! directly.

mod clock;
pub mod driver;
mod registry;

pub use clock::{Clock, ManualClock, SystemClock};
pub use driver::run_tick_driver;
pub use registry::SampleTracker;

use thiserror::Error;

/// Tracker operation failures. None of them leave the registry changed.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum TrackerError {
    #[error("Sample '{0}' is already running")]
    DuplicateName(String),

    #[error("Sample '{0}' not found")]
    NotFound(String),

    #[error("Lag time must be a finite value > 0 seconds (got {0})")]
    InvalidDuration(f64),
}
