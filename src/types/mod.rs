//! Shared data structures for bottoms-up lag calculation
//!
//! - Geometry: WellGeometry inputs and derived Segments
//! - Circulation: VolumeBreakdown, CirculationResult, EfficiencyClass
//! - Report: LagRequest / LagReport / CalculationRecord (history rows)
//! - Sample: TrackedSample countdown state for the live tracker

mod geometry;
mod circulation;
mod report;
mod sample;

pub use geometry::*;
pub use circulation::*;
pub use report::*;
pub use sample::*;
