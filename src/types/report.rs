//! Lag calculation request/report and history rows

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{CirculationResult, EfficiencyClass, GeometryWarning, Segment, SegmentKind, VolumeBreakdown, WellGeometry};
use crate::physics_engine::SlippageTable;

/// Inputs for one bottoms-up calculation.
///
/// The slippage table always comes from configuration; `mud_category`
/// falls back to the configured category when omitted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LagRequest {
    #[serde(default)]
    pub geometry: WellGeometry,
    /// Pump speed (strokes/min)
    pub pump_speed_spm: f64,
    /// Pump rating (bbl/stroke)
    pub pump_rating_bbl_stroke: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mud_category: Option<String>,
}

/// A condition the logger must see next to the value it qualifies.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CalculationWarning {
    /// A derived length had to be clamped because inputs disagree
    Geometry(GeometryWarning),
    /// Bore ID smaller than string OD for this segment
    NegativeVolume { kind: SegmentKind, volume_bbl: f64 },
    /// Slippage factor below the moderate band
    HighSlippage { factor: f64 },
}

impl std::fmt::Display for CalculationWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CalculationWarning::Geometry(w) => write!(f, "Inconsistent geometry: {w}"),
            CalculationWarning::NegativeVolume { kind, volume_bbl } => write!(
                f,
                "{kind}: negative annular volume {volume_bbl:.2} bbl (bore ID smaller than string OD)"
            ),
            CalculationWarning::HighSlippage { factor } => write!(
                f,
                "Slippage factor {factor:.3}: {}",
                EfficiencyClass::HighSlippage.message()
            ),
        }
    }
}

/// Everything one calculation produced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LagReport {
    /// Casing shoe depth minus surface length (ft), not clamped
    pub last_casing_depth_ft: f64,
    /// Open-hole length from the casing shoe (ft)
    pub open_hole_length_ft: f64,
    pub segments: Vec<Segment>,
    pub volumes: VolumeBreakdown,
    pub slippage_table: SlippageTable,
    pub mud_category: String,
    pub slippage_factor: f64,
    pub efficiency: EfficiencyClass,
    pub circulation: CirculationResult,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<CalculationWarning>,
}

impl LagReport {
    pub fn lag_time_minutes(&self) -> f64 {
        self.circulation.lag_time_minutes
    }

    pub fn lag_time_seconds(&self) -> f64 {
        self.circulation.lag_time_seconds()
    }

    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }
}

/// One append-only row in the calculation history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalculationRecord {
    pub timestamp: DateTime<Utc>,
    pub request: LagRequest,
    pub report: LagReport,
}
