//! Well construction inputs and derived annular segments

use serde::{Deserialize, Serialize};

// ============================================================================
// Well Geometry (raw construction inputs)
// ============================================================================

/// Raw well-construction inputs for one lag calculation.
///
/// Diameters are in inches, depths and lengths in feet. The struct is
/// immutable per calculation; segments are derived from it fresh every time.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct WellGeometry {
    /// External diameter of HWDP / drill pipe (in)
    pub drill_pipe_od_in: f64,
    /// External diameter of the drill collars (in)
    pub drill_collar_od_in: f64,
    /// Internal diameter of the riser / surface string (in)
    pub riser_id_in: f64,
    /// Internal diameter of the last casing string (in)
    pub casing_id_in: f64,
    /// Internal diameter of the flowline to the shakers (in)
    pub flowline_id_in: f64,
    /// Open-hole (bit) diameter (in)
    pub open_hole_diameter_in: f64,
    /// Last casing shoe depth (ft)
    pub casing_shoe_depth_ft: f64,
    /// Current measured depth of the hole (ft)
    pub hole_depth_ft: f64,
    /// End of drill collar (ft)
    pub collar_end_depth_ft: f64,
    /// Length of the surface string: wellhead and riser (ft)
    pub surface_length_ft: f64,
    /// Length of the flowline to the shale shakers (ft)
    pub flowline_length_ft: f64,
}

impl WellGeometry {
    /// Every field paired with its name, in declaration order.
    pub fn fields(&self) -> [(&'static str, f64); 11] {
        [
            ("drill_pipe_od_in", self.drill_pipe_od_in),
            ("drill_collar_od_in", self.drill_collar_od_in),
            ("riser_id_in", self.riser_id_in),
            ("casing_id_in", self.casing_id_in),
            ("flowline_id_in", self.flowline_id_in),
            ("open_hole_diameter_in", self.open_hole_diameter_in),
            ("casing_shoe_depth_ft", self.casing_shoe_depth_ft),
            ("hole_depth_ft", self.hole_depth_ft),
            ("collar_end_depth_ft", self.collar_end_depth_ft),
            ("surface_length_ft", self.surface_length_ft),
            ("flowline_length_ft", self.flowline_length_ft),
        ]
    }
}

// ============================================================================
// Segments (derived, transient)
// ============================================================================

/// Which part of the wellbore a segment covers and which string sits inside it.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "snake_case")]
pub enum SegmentKind {
    /// Casing around drill collars
    CasedCollar,
    /// Casing around drill pipe
    CasedPipe,
    /// Open hole around drill collars
    OpenCollar,
    /// Open hole around drill pipe
    OpenPipe,
    /// Wellhead and riser around drill pipe
    SurfaceRiser,
    /// Flowline to the shakers, no string inside
    Flowline,
}

impl SegmentKind {
    /// All kinds in wellbore order, bottom sections first.
    pub const ALL: [SegmentKind; 6] = [
        SegmentKind::CasedCollar,
        SegmentKind::CasedPipe,
        SegmentKind::OpenCollar,
        SegmentKind::OpenPipe,
        SegmentKind::SurfaceRiser,
        SegmentKind::Flowline,
    ];

    /// Get display name for UI
    pub fn display_name(&self) -> &'static str {
        match self {
            SegmentKind::CasedCollar => "Cased Hole / Drill Collar",
            SegmentKind::CasedPipe => "Cased Hole / Drill Pipe",
            SegmentKind::OpenCollar => "Open Hole / Drill Collar",
            SegmentKind::OpenPipe => "Open Hole / Drill Pipe",
            SegmentKind::SurfaceRiser => "Surface Wellhead & Riser",
            SegmentKind::Flowline => "Flowline to Shale Shakers",
        }
    }

    /// True for segments bounded by casing.
    pub fn is_cased(&self) -> bool {
        matches!(self, SegmentKind::CasedCollar | SegmentKind::CasedPipe)
    }

    /// True for segments bounded by the open-hole wall.
    pub fn is_open_hole(&self) -> bool {
        matches!(self, SegmentKind::OpenCollar | SegmentKind::OpenPipe)
    }
}

impl std::fmt::Display for SegmentKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

/// One axial section of the circulation path.
///
/// `outer_diameter_in` is the surrounding bore ID; `inner_diameter_in` is the
/// string OD (0 for the flowline).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Segment {
    pub kind: SegmentKind,
    pub outer_diameter_in: f64,
    pub inner_diameter_in: f64,
    pub length_ft: f64,
}

impl Segment {
    pub fn new(kind: SegmentKind, outer_diameter_in: f64, inner_diameter_in: f64, length_ft: f64) -> Self {
        Self {
            kind,
            outer_diameter_in,
            inner_diameter_in,
            length_ft,
        }
    }

    /// Same diameters, different length.
    pub fn with_length(self, length_ft: f64) -> Self {
        Self { length_ft, ..self }
    }
}

/// How the resolver lays segments out along the wellbore.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum GeometryLayout {
    /// Cased/open hole split around collars and pipe, plus surface and flowline
    #[default]
    Full,
    /// Single open-hole collar annulus plus the flowline
    OpenHoleOnly,
}

impl std::str::FromStr for GeometryLayout {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "full" => Ok(GeometryLayout::Full),
            "open_hole_only" => Ok(GeometryLayout::OpenHoleOnly),
            other => Err(format!("unknown geometry layout '{other}'")),
        }
    }
}

// ============================================================================
// Geometry Warnings
// ============================================================================

/// A resolver step whose raw result disagrees with the rest of the inputs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeometryWarning {
    /// Name of the derived quantity, e.g. `pipe_in_casing_ft`
    pub step: String,
    /// Value before any clamping
    pub raw_value: f64,
    /// Human-readable explanation
    pub message: String,
}

impl std::fmt::Display for GeometryWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} = {:.2}: {}", self.step, self.raw_value, self.message)
    }
}
