//! Annular volume calculations
//!
//! Formula: V = (ID² − OD²) × 0.000971 × L
//!
//! Where:
//! - ID = surrounding bore internal diameter (in)
//! - OD = string external diameter (in), 0 for the flowline
//! - L = segment length (ft)
//!
//! Returns barrels. Negative volumes are NOT clamped: a bore narrower than
//! the string inside it is bad input and must reach the caller.

use crate::types::{Segment, SegmentKind, VolumeBreakdown};

/// Barrels per (in² · ft).
pub const ANNULAR_VOLUME_CONSTANT: f64 = 0.000971;

/// Volume of a single segment (bbl).
pub fn segment_volume(segment: &Segment) -> f64 {
    let outer_sq = segment.outer_diameter_in * segment.outer_diameter_in;
    match segment.kind {
        SegmentKind::Flowline => outer_sq * ANNULAR_VOLUME_CONSTANT * segment.length_ft,
        _ => {
            let inner_sq = segment.inner_diameter_in * segment.inner_diameter_in;
            (outer_sq - inner_sq) * ANNULAR_VOLUME_CONSTANT * segment.length_ft
        }
    }
}

/// Per-segment volumes, grouped sums and total.
pub fn compute_volumes(segments: &[Segment]) -> VolumeBreakdown {
    let mut breakdown = VolumeBreakdown::default();

    for segment in segments {
        let volume = segment_volume(segment);
        *breakdown.per_segment.entry(segment.kind).or_insert(0.0) += volume;

        match segment.kind {
            SegmentKind::OpenCollar | SegmentKind::OpenPipe => breakdown.open_hole_bbl += volume,
            SegmentKind::CasedCollar | SegmentKind::CasedPipe => breakdown.cased_hole_bbl += volume,
            SegmentKind::SurfaceRiser => breakdown.surface_bbl += volume,
            SegmentKind::Flowline => breakdown.flowline_bbl += volume,
        }
        breakdown.total_bbl += volume;
    }

    breakdown
}
