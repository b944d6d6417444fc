//! Volume and circulation results

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::SegmentKind;

/// Compute layer works in minutes, the tracker in seconds.
pub const SECONDS_PER_MINUTE: f64 = 60.0;

/// Per-segment annular volumes plus the grouped sums shown to the logger.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct VolumeBreakdown {
    pub per_segment: BTreeMap<SegmentKind, f64>,
    pub open_hole_bbl: f64,
    pub cased_hole_bbl: f64,
    pub surface_bbl: f64,
    pub flowline_bbl: f64,
    pub total_bbl: f64,
}

impl VolumeBreakdown {
    /// Volume of one segment kind, 0 when the layout did not emit it.
    pub fn segment(&self, kind: SegmentKind) -> f64 {
        self.per_segment.get(&kind).copied().unwrap_or(0.0)
    }

    /// Segment kinds whose computed volume is negative.
    pub fn negative_segments(&self) -> Vec<(SegmentKind, f64)> {
        self.per_segment
            .iter()
            .filter(|(_, v)| **v < 0.0)
            .map(|(k, v)| (*k, *v))
            .collect()
    }
}

/// Pump output converted into a lag time.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CirculationResult {
    /// Total annular volume (bbl)
    pub total_annular_volume_bbl: f64,
    /// Raw pump output (bbl/min)
    pub pump_output_bbl_min: f64,
    /// Output after the slippage discount (bbl/min)
    pub effective_output_bbl_min: f64,
    /// Bottoms-up lag time (min)
    pub lag_time_minutes: f64,
    /// Strokes needed to circulate bottoms-up at the effective rate
    pub strokes_to_surface: f64,
    /// Whether the slippage factor was applied
    pub slippage_applied: bool,
}

impl CirculationResult {
    /// Lag time in tracker units.
    pub fn lag_time_seconds(&self) -> f64 {
        self.lag_time_minutes * SECONDS_PER_MINUTE
    }
}

/// Efficiency band of a slippage factor. Presentation hint only.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum EfficiencyClass {
    /// factor >= 0.9
    High,
    /// 0.75 <= factor < 0.9
    Moderate,
    /// factor < 0.75
    HighSlippage,
}

impl EfficiencyClass {
    pub const HIGH_THRESHOLD: f64 = 0.9;
    pub const MODERATE_THRESHOLD: f64 = 0.75;

    pub fn classify(factor: f64) -> Self {
        if factor >= Self::HIGH_THRESHOLD {
            EfficiencyClass::High
        } else if factor >= Self::MODERATE_THRESHOLD {
            EfficiencyClass::Moderate
        } else {
            EfficiencyClass::HighSlippage
        }
    }

    pub fn message(&self) -> &'static str {
        match self {
            EfficiencyClass::High => "Minimal slippage: High efficiency.",
            EfficiencyClass::Moderate => "Moderate slippage: Balanced efficiency.",
            EfficiencyClass::HighSlippage => "High slippage: Significant inefficiencies.",
        }
    }
}

impl std::fmt::Display for EfficiencyClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EfficiencyClass::High => write!(f, "High Efficiency"),
            EfficiencyClass::Moderate => write!(f, "Moderate"),
            EfficiencyClass::HighSlippage => write!(f, "High Slippage"),
        }
    }
}
