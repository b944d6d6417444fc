//! SAIREN-LAG: Bottoms-up lag time for mudlogging
//!
//! Computes how long drilled cuttings take to travel from the bit to the
//! shakers and tracks live samples against that time.
//!
//! ## Architecture
//!
//! - **Physics Engine**: geometry resolution, annular volume, slippage, lag time
//! - **Pipeline**: one `LagRequest` through every stage into a `LagReport`
//! - **Tracker**: tick-driven registry of named sample countdowns
//! - **Storage**: append-only calculation history (sled or in-memory)
//! - **API**: axum HTTP surface over the pipeline and tracker

pub mod api;
pub mod config;
pub mod physics_engine;
pub mod pipeline;
pub mod storage;
pub mod tracker;
pub mod types;

// Re-export configuration
pub use config::{ConfigError, LagConfig};

// Re-export the compute chain
pub use physics_engine::{
    compute_geometry, compute_lag_time, compute_volumes, resolve_geometry, resolve_slippage, LagError,
    SlippageTable, ANNULAR_VOLUME_CONSTANT,
};
pub use pipeline::LagPipeline;

// Re-export commonly used types
pub use types::{
    CalculationRecord, CalculationWarning, EfficiencyClass, LagReport, LagRequest, Segment, SegmentKind,
    TrackedSample, VolumeBreakdown, WellGeometry, SECONDS_PER_MINUTE,
};

// Re-export tracker and storage
pub use storage::{HistorySink, HistoryStorage, InMemoryHistory, StorageError};
pub use tracker::{Clock, ManualClock, SampleTracker, SystemClock, TrackerError};
