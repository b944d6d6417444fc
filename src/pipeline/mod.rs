//! Lag Calculation Pipeline
//!
//! One request in, one report out:
//!
//! 1. Resolve geometry into segments (layout and clamping from config)
//! 2. Annular volume per segment and total
//! 3. Slippage factor from the request's table/category or config defaults
//! 4. Circulation figures and lag time
//! 5. Collect warnings, append the history row
//!
//! Stages are pure calls into `physics_engine`; the only side effect is the
//! optional history append, and a failing sink never fails the calculation.

use chrono::Utc;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::config::LagConfig;
use crate::physics_engine::{self, LagError, SlippageTable};
use crate::storage::HistorySink;
use crate::types::{
    CalculationRecord, CalculationWarning, EfficiencyClass, GeometryWarning, LagReport, LagRequest,
    SECONDS_PER_MINUTE,
};

/// Runs bottoms-up calculations against a fixed configuration.
#[derive(Clone)]
pub struct LagPipeline {
    config: LagConfig,
    sink: Option<Arc<dyn HistorySink>>,
}

impl LagPipeline {
    pub fn new(config: LagConfig) -> Self {
        Self { config, sink: None }
    }

    /// Append every successful report to `sink`.
    pub fn with_sink(mut self, sink: Arc<dyn HistorySink>) -> Self {
        self.sink = Some(sink);
        self
    }

    pub fn config(&self) -> &LagConfig {
        &self.config
    }

    /// Configured table and canonical category key for a request.
    fn select_slippage(&self, request: &LagRequest) -> Result<(SlippageTable, String, f64), LagError> {
        let table = self.config.slippage.table;
        let key = request
            .mud_category
            .as_deref()
            .unwrap_or(self.config.slippage.category.as_str());
        let entry = table.entry(key).ok_or_else(|| LagError::UnknownCategory {
            table: table.name().to_string(),
            key: key.to_string(),
        })?;
        Ok((table, entry.key.to_string(), entry.factor))
    }

    /// Compute a full report without touching the history sink.
    pub fn compute(&self, request: &LagRequest) -> Result<LagReport, LagError> {
        let resolution = physics_engine::resolve_geometry(&request.geometry, &self.config.geometry)?;
        let volumes = physics_engine::compute_volumes(&resolution.segments);

        if volumes.total_bbl <= 0.0 {
            let mut reasons = resolution.warnings.clone();
            reasons.push(GeometryWarning {
                step: "total_annular_volume_bbl".to_string(),
                raw_value: volumes.total_bbl,
                message: "no annular volume between bit and shakers".to_string(),
            });
            return Err(LagError::InconsistentGeometry(reasons));
        }

        let (slippage_table, mud_category, slippage_factor) = self.select_slippage(request)?;
        let apply = self.config.slippage.apply_slippage;
        let circulation = physics_engine::compute_circulation(
            volumes.total_bbl,
            request.pump_speed_spm,
            request.pump_rating_bbl_stroke,
            slippage_factor,
            apply,
        )?;
        let efficiency = EfficiencyClass::classify(slippage_factor);

        let mut warnings: Vec<CalculationWarning> = resolution
            .warnings
            .iter()
            .cloned()
            .map(CalculationWarning::Geometry)
            .collect();
        warnings.extend(
            volumes
                .negative_segments()
                .into_iter()
                .map(|(kind, volume_bbl)| CalculationWarning::NegativeVolume { kind, volume_bbl }),
        );
        if apply && efficiency == EfficiencyClass::HighSlippage {
            warnings.push(CalculationWarning::HighSlippage { factor: slippage_factor });
        }

        for w in &warnings {
            warn!(well = %self.config.well.name, "{}", w);
        }
        debug!(
            total_bbl = volumes.total_bbl,
            effective_output_bbl_min = circulation.effective_output_bbl_min,
            lag_seconds = circulation.lag_time_minutes * SECONDS_PER_MINUTE,
            "Lag calculation complete"
        );

        Ok(LagReport {
            last_casing_depth_ft: resolution.last_casing_depth_ft,
            open_hole_length_ft: resolution.open_hole_length_ft,
            segments: resolution.segments,
            volumes,
            slippage_table,
            mud_category,
            slippage_factor,
            efficiency,
            circulation,
            warnings,
        })
    }

    /// Compute a report and append it to the history sink, if any.
    pub fn run(&self, request: &LagRequest) -> Result<LagReport, LagError> {
        let report = self.compute(request)?;
        self.record(request, &report);
        Ok(report)
    }

    /// Append an already computed report to the history sink, if any.
    ///
    /// Sink failures are logged and never fail the calculation.
    pub fn record(&self, request: &LagRequest, report: &LagReport) {
        info!(
            well = %self.config.well.name,
            lag_minutes = report.lag_time_minutes(),
            total_bbl = report.volumes.total_bbl,
            warnings = report.warnings.len(),
            "Bottoms-up lag computed"
        );

        if let Some(sink) = &self.sink {
            let record = CalculationRecord {
                timestamp: Utc::now(),
                request: request.clone(),
                report: report.clone(),
            };
            if let Err(e) = sink.append(&record) {
                warn!(backend = sink.backend_name(), error = %e, "Failed to record lag calculation");
            }
        }
    }
}

impl std::fmt::Debug for LagPipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LagPipeline")
            .field("well", &self.config.well.name)
            .field("history", &self.sink.as_ref().map(|s| s.backend_name()))
            .finish()
    }
}
