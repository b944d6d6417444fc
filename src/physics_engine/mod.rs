//! Physics Engine Module
//!
//! Deterministic bottoms-up lag calculations. Pure functions only: no I/O,
//! no clocks, no shared state.
//!
//! Data flows strictly:
//! - `geometry`: well construction inputs → non-overlapping annular segments
//! - `volume`: segments → per-segment and total annular volume (bbl)
//! - `slippage`: mud category → efficiency factor in (0, 1]
//! - `lag_time`: volume + pump output + slippage → lag time (min)

pub mod geometry;
pub mod lag_time;
pub mod slippage;
pub mod volume;

pub use geometry::{compute_geometry, resolve_geometry, validate_geometry, GeometryResolution};
pub use lag_time::{compute_circulation, compute_lag_time};
pub use slippage::{resolve_slippage, SlippageEntry, SlippageTable};
pub use volume::{compute_volumes, segment_volume, ANNULAR_VOLUME_CONSTANT};

use thiserror::Error;

use crate::types::GeometryWarning;

// ============================================================================
// Error Types
// ============================================================================

/// Failures of the compute chain. All are recoverable: callers render them as
/// a blocking warning and withhold the dependent value.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum LagError {
    #[error("Pump output must be greater than 0 to calculate lag time (got {0:.4} bbl/min)")]
    InvalidPumpOutput(f64),

    #[error("Slippage factor must be within (0, 1] (got {0})")]
    InvalidSlippageFactor(f64),

    #[error("Unknown mud category '{key}' for slippage table '{table}'")]
    UnknownCategory { table: String, key: String },

    #[error("Unknown slippage table: {0}")]
    UnknownTable(String),

    #[error("Invalid well geometry: {field} = {value} (must be a finite value >= 0)")]
    InvalidGeometry { field: &'static str, value: f64 },

    #[error("Inconsistent well geometry: {}", format_geometry_warnings(.0))]
    InconsistentGeometry(Vec<GeometryWarning>),
}

fn format_geometry_warnings(warnings: &[GeometryWarning]) -> String {
    warnings
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}
