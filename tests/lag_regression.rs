//! Lag Calculation Regression Tests
//!
//! Pins the reference scenario and the physical properties of the compute
//! chain through the public API.

use sairen_lag::{
    compute_geometry, compute_lag_time, compute_volumes, resolve_slippage, CalculationWarning, LagConfig,
    LagError, LagPipeline, LagRequest, SegmentKind, SlippageTable, WellGeometry, ANNULAR_VOLUME_CONSTANT,
};

const TOLERANCE: f64 = 1e-9;

fn reference_geometry() -> WellGeometry {
    WellGeometry {
        drill_pipe_od_in: 5.0,
        drill_collar_od_in: 6.5,
        riser_id_in: 19.5,
        casing_id_in: 8.5,
        flowline_id_in: 0.0,
        open_hole_diameter_in: 8.5,
        casing_shoe_depth_ft: 3000.0,
        hole_depth_ft: 9000.0,
        collar_end_depth_ft: 9100.0,
        surface_length_ft: 50.0,
        flowline_length_ft: 0.0,
    }
}

fn reference_request() -> LagRequest {
    LagRequest {
        geometry: reference_geometry(),
        pump_speed_spm: 80.0,
        pump_rating_bbl_stroke: 0.1,
        mud_category: None,
    }
}

#[test]
fn reference_scenario_volume_and_lag() {
    let segments = compute_geometry(&reference_geometry());
    let volumes = compute_volumes(&segments);
    assert!((volumes.total_bbl - 282.330_387_5).abs() < TOLERANCE);

    let factor = resolve_slippage("coarse", "water_based").unwrap();
    let lag = compute_lag_time(volumes.total_bbl, 80.0, 0.1, factor, true).unwrap();
    assert!((lag - 35.291_298_437_5).abs() < TOLERANCE);
}

#[test]
fn reference_scenario_through_pipeline() {
    let report = LagPipeline::new(LagConfig::default())
        .run(&reference_request())
        .unwrap();
    assert!((report.lag_time_minutes() - 35.291_298_437_5).abs() < TOLERANCE);
    assert!((report.lag_time_seconds() - 35.291_298_437_5 * 60.0).abs() < 1e-6);
    assert!((report.circulation.strokes_to_surface - 35.291_298_437_5 * 80.0).abs() < 1e-6);
    assert_eq!(report.volumes.segment(SegmentKind::CasedPipe), 0.0);
    assert_eq!(report.volumes.segment(SegmentKind::OpenPipe), 0.0);
    assert!(report.has_warnings());
}

#[test]
fn lengths_never_negative_for_non_negative_inputs() {
    let depths = [0.0, 40.0, 500.0, 3000.0, 9000.0, 12000.0];
    for &shoe in &depths {
        for &hole in &depths {
            for &collar in &depths {
                for &surface in &[0.0, 50.0, 200.0] {
                    let g = WellGeometry {
                        casing_shoe_depth_ft: shoe,
                        hole_depth_ft: hole,
                        collar_end_depth_ft: collar,
                        surface_length_ft: surface,
                        ..reference_geometry()
                    };
                    for s in compute_geometry(&g) {
                        assert!(
                            s.length_ft >= 0.0,
                            "{:?} negative for shoe={shoe} hole={hole} collar={collar} surface={surface}",
                            s.kind
                        );
                    }
                }
            }
        }
    }
}

#[test]
fn volume_scales_linearly_with_length() {
    let base = compute_geometry(&reference_geometry());
    let single = compute_volumes(&base).total_bbl;
    let doubled: Vec<_> = base.iter().map(|s| s.with_length(s.length_ft * 2.0)).collect();
    assert!((compute_volumes(&doubled).total_bbl - 2.0 * single).abs() < 1e-9);

    // Cased collar annulus over 1000 ft: (8.5² − 6.5²) × 0.000971 × 1000
    let seg = base[0].with_length(1000.0);
    let expected = (seg.outer_diameter_in.powi(2) - seg.inner_diameter_in.powi(2)) * ANNULAR_VOLUME_CONSTANT * 1000.0;
    assert!((compute_volumes(&[seg]).total_bbl - expected).abs() < 1e-12);
}

#[test]
fn lag_decreases_with_pump_output_and_factor() {
    let volume = 282.330_387_5;
    let mut previous = f64::INFINITY;
    for spm in [20.0, 40.0, 80.0, 120.0] {
        let lag = compute_lag_time(volume, spm, 0.1, 1.0, true).unwrap();
        assert!(lag < previous);
        previous = lag;
    }

    let mut previous = f64::INFINITY;
    for factor in [0.4, 0.6, 0.825, 1.0] {
        let lag = compute_lag_time(volume, 80.0, 0.1, factor, true).unwrap();
        assert!(lag < previous);
        previous = lag;
    }
}

#[test]
fn every_table_key_resolves_to_its_constant() {
    let expected = [
        ("coarse", "water_based", 1.0),
        ("coarse", "oil_based", 0.90),
        ("coarse", "heavy", 0.75),
        ("fine", "air_drilling", 0.40),
        ("fine", "aerated_mud", 0.60),
        ("fine", "low_density_wbm", 0.675),
        ("fine", "high_density_wbm", 0.825),
        ("fine", "low_density_obm", 0.85),
        ("fine", "high_density_obm", 0.94),
        ("fine", "synthetic_based", 0.915),
        ("fine", "weighted_mud", 0.975),
    ];
    for (table, key, factor) in expected {
        assert_eq!(resolve_slippage(table, key).unwrap(), factor, "{table}/{key}");
    }
    let total: usize = SlippageTable::ALL.iter().map(|t| t.entries().len()).sum();
    assert_eq!(total, expected.len());
}

#[test]
fn zero_pump_output_withholds_lag() {
    assert!(matches!(
        compute_lag_time(100.0, 0.0, 0.1, 1.0, true),
        Err(LagError::InvalidPumpOutput(_))
    ));
    assert!(matches!(
        compute_lag_time(100.0, 80.0, -0.1, 1.0, true),
        Err(LagError::InvalidPumpOutput(_))
    ));
}

#[test]
fn open_hole_only_layout_matches_simple_model() {
    let mut config = LagConfig::default();
    config.geometry.layout = sairen_lag::types::GeometryLayout::OpenHoleOnly;
    let request = LagRequest {
        geometry: WellGeometry {
            open_hole_diameter_in: 8.5,
            drill_collar_od_in: 6.5,
            casing_shoe_depth_ft: 0.0,
            hole_depth_ft: 1000.0,
            flowline_id_in: 10.0,
            flowline_length_ft: 100.0,
            ..WellGeometry::default()
        },
        ..reference_request()
    };
    let report = LagPipeline::new(config).run(&request).unwrap();
    let expected = (8.5_f64.powi(2) - 6.5_f64.powi(2)) * ANNULAR_VOLUME_CONSTANT * 1000.0
        + 10.0_f64.powi(2) * ANNULAR_VOLUME_CONSTANT * 100.0;
    assert!((report.volumes.total_bbl - expected).abs() < TOLERANCE);
    assert!(!report
        .warnings
        .iter()
        .any(|w| matches!(w, CalculationWarning::Geometry(_))));
}
