//! Wellbore decomposition into annular segments
//!
//! Turns raw construction inputs into ordered, non-overlapping axial segments:
//! cased hole and open hole, each split around drill collars and drill pipe,
//! plus the surface string and the flowline.
//!
//! Every subtraction that can go negative is clamped at its own step, in
//! order. Later steps consume the already-clamped values, so the order below
//! is part of the contract:
//!
//! 1. last_casing_depth   = casing_shoe − surface            (not clamped)
//! 2. open_hole_length    = max(0, hole − (last_casing + surface))
//! 3. collar_in_casing    = max(0, collar_end − open_hole)
//! 4. collar_in_open_hole = max(0, collar_end − collar_in_casing)
//! 5. pipe_in_casing      = max(0, last_casing − collar_in_casing)
//! 6. pipe_in_open_hole   = max(0, open_hole − collar_end)
//! 7. surface             = surface_length                   (not clamped)

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::LagError;
use crate::config::GeometryConfig;
use crate::types::{GeometryLayout, GeometryWarning, Segment, SegmentKind, WellGeometry};

/// Output of the resolver: the segments plus whatever it had to clamp.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeometryResolution {
    pub last_casing_depth_ft: f64,
    pub open_hole_length_ft: f64,
    pub segments: Vec<Segment>,
    pub warnings: Vec<GeometryWarning>,
}

/// Derived lengths after step-wise clamping, with the raw values of the
/// steps that signal inconsistent input.
#[derive(Debug, Clone, Copy)]
struct DerivedLengths {
    last_casing_depth: f64,
    open_hole_raw: f64,
    open_hole: f64,
    collar_in_casing: f64,
    collar_in_open_hole: f64,
    pipe_in_casing_raw: f64,
    pipe_in_casing: f64,
    pipe_in_open_hole: f64,
    surface: f64,
}

fn derive_lengths(g: &WellGeometry) -> DerivedLengths {
    let last_casing_depth = g.casing_shoe_depth_ft - g.surface_length_ft;

    let open_hole_raw = g.hole_depth_ft - (last_casing_depth + g.surface_length_ft);
    let open_hole = open_hole_raw.max(0.0);

    let collar_in_casing = (g.collar_end_depth_ft - open_hole).max(0.0);
    let collar_in_open_hole = (g.collar_end_depth_ft - collar_in_casing).max(0.0);

    let pipe_in_casing_raw = last_casing_depth - collar_in_casing;
    let pipe_in_casing = pipe_in_casing_raw.max(0.0);

    let pipe_in_open_hole = (open_hole - g.collar_end_depth_ft).max(0.0);

    DerivedLengths {
        last_casing_depth,
        open_hole_raw,
        open_hole,
        collar_in_casing,
        collar_in_open_hole,
        pipe_in_casing_raw,
        pipe_in_casing,
        pipe_in_open_hole,
        surface: g.surface_length_ft,
    }
}

/// Steps 3, 4 and 6 floor at zero as the normal cased/open split. Only the
/// steps below mean the inputs disagree with each other.
fn inconsistencies(g: &WellGeometry, d: &DerivedLengths, layout: GeometryLayout) -> Vec<GeometryWarning> {
    let mut warnings = Vec::new();

    if d.last_casing_depth < 0.0 {
        warnings.push(GeometryWarning {
            step: "last_casing_depth_ft".to_string(),
            raw_value: d.last_casing_depth,
            message: "casing shoe is shallower than the surface string".to_string(),
        });
    }
    if d.open_hole_raw < 0.0 {
        warnings.push(GeometryWarning {
            step: "open_hole_length_ft".to_string(),
            raw_value: d.open_hole_raw,
            message: "hole depth is above the casing shoe".to_string(),
        });
    }
    if layout == GeometryLayout::Full {
        if d.pipe_in_casing_raw < 0.0 {
            warnings.push(GeometryWarning {
                step: "pipe_in_casing_ft".to_string(),
                raw_value: d.pipe_in_casing_raw,
                message: "drill collars extend above the top of the casing".to_string(),
            });
        }
        if g.collar_end_depth_ft > g.hole_depth_ft {
            warnings.push(GeometryWarning {
                step: "collar_end_depth_ft".to_string(),
                raw_value: g.collar_end_depth_ft,
                message: format!(
                    "end of drill collar is deeper than the hole ({:.1} ft)",
                    g.hole_depth_ft
                ),
            });
        }
    }

    warnings
}

fn build_segments(g: &WellGeometry, d: &DerivedLengths, cfg: &GeometryConfig) -> Vec<Segment> {
    let mut segments = match cfg.layout {
        GeometryLayout::Full => vec![
            Segment::new(SegmentKind::CasedCollar, g.casing_id_in, g.drill_collar_od_in, d.collar_in_casing),
            Segment::new(SegmentKind::CasedPipe, g.casing_id_in, g.drill_pipe_od_in, d.pipe_in_casing),
            Segment::new(SegmentKind::OpenCollar, g.open_hole_diameter_in, g.drill_collar_od_in, d.collar_in_open_hole),
            Segment::new(SegmentKind::OpenPipe, g.open_hole_diameter_in, g.drill_pipe_od_in, d.pipe_in_open_hole),
            Segment::new(SegmentKind::SurfaceRiser, g.riser_id_in, g.drill_pipe_od_in, d.surface),
        ],
        GeometryLayout::OpenHoleOnly => vec![Segment::new(
            SegmentKind::OpenCollar,
            g.open_hole_diameter_in,
            g.drill_collar_od_in,
            d.open_hole,
        )],
    };
    if cfg.include_flowline {
        segments.push(Segment::new(SegmentKind::Flowline, g.flowline_id_in, 0.0, g.flowline_length_ft));
    }
    segments
}

/// Reject negative or non-finite inputs.
pub fn validate_geometry(g: &WellGeometry) -> Result<(), LagError> {
    for (field, value) in g.fields() {
        if !value.is_finite() || value < 0.0 {
            return Err(LagError::InvalidGeometry { field, value });
        }
    }
    Ok(())
}

/// Resolve segments using the configured layout and clamping policy.
///
/// With `clamp_negative_segments = false` any inconsistency fails with
/// [`LagError::InconsistentGeometry`] instead of being clamped away.
pub fn resolve_geometry(g: &WellGeometry, cfg: &GeometryConfig) -> Result<GeometryResolution, LagError> {
    validate_geometry(g)?;

    let derived = derive_lengths(g);
    let warnings = inconsistencies(g, &derived, cfg.layout);

    if !cfg.clamp_negative_segments && !warnings.is_empty() {
        return Err(LagError::InconsistentGeometry(warnings));
    }

    let segments = build_segments(g, &derived, cfg);
    debug!(
        last_casing_depth_ft = derived.last_casing_depth,
        open_hole_length_ft = derived.open_hole,
        segments = segments.len(),
        warnings = warnings.len(),
        "Resolved well geometry"
    );

    Ok(GeometryResolution {
        last_casing_depth_ft: derived.last_casing_depth,
        open_hole_length_ft: derived.open_hole,
        segments,
        warnings,
    })
}

/// Segments for the full layout including the flowline.
pub fn compute_geometry(g: &WellGeometry) -> Vec<Segment> {
    build_segments(g, &derive_lengths(g), &GeometryConfig::default())
}

// ============================================================================
// Tests
// ============================================================================
