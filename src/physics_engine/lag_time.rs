//! Lag time from annular volume and pump output
//!
//! - pump_output      = pump_speed × pump_rating          (bbl/min)
//! - effective_output = pump_output × slippage_factor     (bbl/min)
//! - lag_time         = total_annular_volume / effective_output (min)
//!
//! `pump_output <= 0` is the only error path of the compute chain proper:
//! the division is never attempted.

use super::LagError;
use crate::types::CirculationResult;

/// Full circulation figures for one volume / pump / mud combination.
///
/// With `apply_slippage = false` the raw pump output is used and the factor
/// is ignored.
pub fn compute_circulation(
    total_annular_volume_bbl: f64,
    pump_speed_spm: f64,
    pump_rating_bbl_stroke: f64,
    slippage_factor: f64,
    apply_slippage: bool,
) -> Result<CirculationResult, LagError> {
    let pump_output = pump_speed_spm * pump_rating_bbl_stroke;
    if !pump_output.is_finite() || pump_output <= 0.0 {
        return Err(LagError::InvalidPumpOutput(pump_output));
    }

    let effective_output = if apply_slippage {
        if !slippage_factor.is_finite() || slippage_factor <= 0.0 || slippage_factor > 1.0 {
            return Err(LagError::InvalidSlippageFactor(slippage_factor));
        }
        pump_output * slippage_factor
    } else {
        pump_output
    };

    let lag_time_minutes = total_annular_volume_bbl / effective_output;

    Ok(CirculationResult {
        total_annular_volume_bbl,
        pump_output_bbl_min: pump_output,
        effective_output_bbl_min: effective_output,
        lag_time_minutes,
        strokes_to_surface: lag_time_minutes * pump_speed_spm,
        slippage_applied: apply_slippage,
    })
}

/// Lag time in minutes.
pub fn compute_lag_time(
    total_annular_volume_bbl: f64,
    pump_speed_spm: f64,
    pump_rating_bbl_stroke: f64,
    slippage_factor: f64,
    apply_slippage: bool,
) -> Result<f64, LagError> {
    compute_circulation(
        total_annular_volume_bbl,
        pump_speed_spm,
        pump_rating_bbl_stroke,
        slippage_factor,
        apply_slippage,
    )
    .map(|r| r.lag_time_minutes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_basic_lag() {
        let lag = compute_lag_time(400.0, 80.0, 0.1, 1.0, true).unwrap();
        assert!((lag - 50.0).abs() < 1e-12);
    }

    #[test]
    fn test_slippage_lengthens_lag() {
        let r = compute_circulation(400.0, 80.0, 0.1, 0.8, true).unwrap();
        assert!((r.pump_output_bbl_min - 8.0).abs() < 1e-12);
        assert!((r.effective_output_bbl_min - 6.4).abs() < 1e-12);
        assert!((r.lag_time_minutes - 62.5).abs() < 1e-9);
        assert!((r.strokes_to_surface - 5000.0).abs() < 1e-6);
    }

    #[test]
    fn test_slippage_disabled_uses_raw_output() {
        let with = compute_lag_time(400.0, 80.0, 0.1, 0.5, true).unwrap();
        let without = compute_lag_time(400.0, 80.0, 0.1, 0.5, false).unwrap();
        assert!((without - 50.0).abs() < 1e-12);
        assert!(with > without);
    }

    #[test]
    fn test_zero_pump_output_is_error() {
        assert_eq!(
            compute_lag_time(400.0, 0.0, 0.1, 1.0, true),
            Err(LagError::InvalidPumpOutput(0.0))
        );
        assert!(matches!(
            compute_lag_time(400.0, 80.0, -0.1, 1.0, true),
            Err(LagError::InvalidPumpOutput(_))
        ));
    }

    #[test]
    fn test_invalid_factor_only_checked_when_applied() {
        assert_eq!(
            compute_lag_time(400.0, 80.0, 0.1, 0.0, true),
            Err(LagError::InvalidSlippageFactor(0.0))
        );
        assert!(compute_lag_time(400.0, 80.0, 0.1, 1.5, true).is_err());
        assert!(compute_lag_time(400.0, 80.0, 0.1, 0.0, false).is_ok());
    }

    #[test]
    fn test_monotonic_in_pump_output() {
        let mut previous = f64::INFINITY;
        for spm in [10.0, 20.0, 40.0, 80.0, 120.0, 160.0] {
            let lag = compute_lag_time(300.0, spm, 0.1, 0.9, true).unwrap();
            assert!(lag < previous, "lag must shrink as pump output grows");
            previous = lag;
        }
    }

    #[test]
    fn test_monotonic_in_slippage_factor() {
        let mut previous = f64::INFINITY;
        for factor in [0.4, 0.6, 0.675, 0.75, 0.825, 0.9, 0.975, 1.0] {
            let lag = compute_lag_time(300.0, 80.0, 0.1, factor, true).unwrap();
            assert!(lag < previous, "higher efficiency must shorten lag");
            previous = lag;
        }
    }
}
