//! API handlers and shared state

use axum::extract::{Path, Query, State};
use axum::response::Response;
use axum::Json;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::warn;

use super::envelope::{ApiErrorResponse, ApiResponse};
use crate::config::{defaults, LagConfig};
use crate::physics_engine::{self, LagError, SlippageEntry, SlippageTable};
use crate::pipeline::LagPipeline;
use crate::storage::HistorySink;
use crate::tracker::{SampleTracker, TrackerError};
use crate::types::{
    CalculationWarning, EfficiencyClass, GeometryWarning, LagReport, LagRequest, Segment, TrackedSample,
    VolumeBreakdown, WellGeometry, SECONDS_PER_MINUTE,
};

// ============================================================================
// State
// ============================================================================

/// Everything a handler can reach. Owned by the host, cloned per request.
#[derive(Clone)]
pub struct AppState {
    pub tracker: Arc<SampleTracker>,
    pub pipeline: Arc<LagPipeline>,
    pub history: Option<Arc<dyn HistorySink>>,
}

impl AppState {
    /// Wire a pipeline to the same history sink the history endpoint reads.
    pub fn new(config: LagConfig, tracker: Arc<SampleTracker>, history: Option<Arc<dyn HistorySink>>) -> Self {
        let pipeline = match &history {
            Some(sink) => LagPipeline::new(config).with_sink(Arc::clone(sink)),
            None => LagPipeline::new(config),
        };
        Self {
            tracker,
            pipeline: Arc::new(pipeline),
            history,
        }
    }

    pub fn config(&self) -> &LagConfig {
        self.pipeline.config()
    }
}

// ============================================================================
// Error mapping
// ============================================================================

fn lag_error_response(e: &LagError) -> Response {
    match e {
        LagError::InvalidPumpOutput(_)
        | LagError::InvalidGeometry { .. }
        | LagError::InconsistentGeometry(_) => ApiErrorResponse::unprocessable(e.to_string()),
        LagError::InvalidSlippageFactor(_) | LagError::UnknownCategory { .. } | LagError::UnknownTable(_) => {
            ApiErrorResponse::bad_request(e.to_string())
        }
    }
}

fn tracker_error_response(e: &TrackerError) -> Response {
    match e {
        TrackerError::DuplicateName(_) => ApiErrorResponse::conflict(e.to_string()),
        TrackerError::NotFound(_) => ApiErrorResponse::not_found(e.to_string()),
        TrackerError::InvalidDuration(_) => ApiErrorResponse::bad_request(e.to_string()),
    }
}

// ============================================================================
// Request / response types
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct LimitQuery {
    #[serde(default)]
    pub limit: Option<usize>,
}

/// Where a sample's lag time comes from. Checked in field order: explicit
/// seconds, explicit minutes, then a full calculation.
#[derive(Debug, Default, Deserialize)]
pub struct LagSource {
    #[serde(default)]
    pub lag_time_seconds: Option<f64>,
    #[serde(default)]
    pub lag_time_minutes: Option<f64>,
    #[serde(default)]
    pub request: Option<LagRequest>,
}

#[derive(Debug, Deserialize)]
pub struct StartSampleRequest {
    pub name: String,
    #[serde(flatten)]
    pub source: LagSource,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub well: String,
    pub running_samples: usize,
    pub tracked_samples: usize,
    pub history_backend: Option<&'static str>,
}

#[derive(Debug, Serialize)]
pub struct GeometryResponse {
    pub last_casing_depth_ft: f64,
    pub open_hole_length_ft: f64,
    pub segments: Vec<Segment>,
    pub volumes: VolumeBreakdown,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<GeometryWarning>,
}

#[derive(Debug, Serialize)]
pub struct SlippageTableResponse {
    pub table: SlippageTable,
    pub default_category: &'static str,
    pub entries: &'static [SlippageEntry],
}

#[derive(Debug, Serialize)]
pub struct SlippageFactorResponse {
    pub table: SlippageTable,
    pub category: &'static str,
    pub label: &'static str,
    pub factor: f64,
    pub efficiency: EfficiencyClass,
    pub message: &'static str,
}

/// A tracked sample plus derived progress for display.
#[derive(Debug, Serialize)]
pub struct SampleView {
    #[serde(flatten)]
    pub sample: TrackedSample,
    pub progress: f64,
}

impl From<TrackedSample> for SampleView {
    fn from(sample: TrackedSample) -> Self {
        let progress = sample.progress();
        Self { sample, progress }
    }
}

#[derive(Debug, Serialize)]
pub struct SampleResponse {
    pub sample: SampleView,
    /// Present when the lag time was computed from a `LagRequest`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub report: Option<LagReport>,
}

// ============================================================================
// Internal helpers
// ============================================================================

/// A calculation backing a sample operation. History is written only once
/// the tracker has accepted the result.
struct Computed {
    request: LagRequest,
    report: LagReport,
}

impl Computed {
    fn record(self, state: &AppState) -> LagReport {
        state.pipeline.record(&self.request, &self.report);
        self.report
    }
}

/// Lag time in seconds for a sample source, with the calculation when one was run.
fn resolve_lag_seconds(state: &AppState, source: LagSource) -> Result<(f64, Option<Computed>), Response> {
    if let Some(seconds) = source.lag_time_seconds {
        return Ok((seconds, None));
    }
    if let Some(minutes) = source.lag_time_minutes {
        return Ok((minutes * SECONDS_PER_MINUTE, None));
    }
    match source.request {
        Some(request) => {
            let report = state.pipeline.compute(&request).map_err(|e| lag_error_response(&e))?;
            Ok((report.lag_time_seconds(), Some(Computed { request, report })))
        }
        None => Err(ApiErrorResponse::bad_request(
            "one of lag_time_seconds, lag_time_minutes or request is required",
        )),
    }
}

fn parse_table(table: &str) -> Result<SlippageTable, Response> {
    table
        .parse::<SlippageTable>()
        .map_err(|e| ApiErrorResponse::not_found(e.to_string()))
}

// ============================================================================
// Handlers
// ============================================================================

/// GET /api/v1/health
pub async fn health(State(state): State<AppState>) -> Response {
    ApiResponse::ok(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        well: state.config().well.name.clone(),
        running_samples: state.tracker.running_count(),
        tracked_samples: state.tracker.len(),
        history_backend: state.history.as_ref().map(|h| h.backend_name()),
    })
}

/// POST /api/v1/lag
pub async fn calculate_lag(State(state): State<AppState>, Json(request): Json<LagRequest>) -> Response {
    match state.pipeline.run(&request) {
        Ok(report) => ApiResponse::ok(report),
        Err(e) => lag_error_response(&e),
    }
}

/// POST /api/v1/geometry
pub async fn resolve_geometry(State(state): State<AppState>, Json(geometry): Json<WellGeometry>) -> Response {
    match physics_engine::resolve_geometry(&geometry, &state.config().geometry) {
        Ok(resolution) => {
            let volumes = physics_engine::compute_volumes(&resolution.segments);
            ApiResponse::ok(GeometryResponse {
                last_casing_depth_ft: resolution.last_casing_depth_ft,
                open_hole_length_ft: resolution.open_hole_length_ft,
                segments: resolution.segments,
                volumes,
                warnings: resolution.warnings,
            })
        }
        Err(e) => lag_error_response(&e),
    }
}

/// GET /api/v1/slippage/:table
pub async fn slippage_table(Path(table): Path<String>) -> Response {
    match parse_table(&table) {
        Ok(t) => ApiResponse::ok(SlippageTableResponse {
            table: t,
            default_category: t.default_category(),
            entries: t.entries(),
        }),
        Err(resp) => resp,
    }
}

/// GET /api/v1/slippage/:table/:key
pub async fn slippage_factor(Path((table, key)): Path<(String, String)>) -> Response {
    let t = match parse_table(&table) {
        Ok(t) => t,
        Err(resp) => return resp,
    };
    match t.entry(&key) {
        Some(entry) => {
            let efficiency = EfficiencyClass::classify(entry.factor);
            ApiResponse::ok(SlippageFactorResponse {
                table: t,
                category: entry.key,
                label: entry.label,
                factor: entry.factor,
                efficiency,
                message: efficiency.message(),
            })
        }
        None => ApiErrorResponse::not_found(format!("Unknown mud category '{key}' for slippage table '{t}'")),
    }
}

/// GET /api/v1/samples
pub async fn list_samples(State(state): State<AppState>) -> Response {
    let samples: Vec<SampleView> = state.tracker.snapshot().into_iter().map(Into::into).collect();
    ApiResponse::ok(samples)
}

/// GET /api/v1/samples/:name
pub async fn get_sample(State(state): State<AppState>, Path(name): Path<String>) -> Response {
    match state.tracker.get(&name) {
        Some(sample) => ApiResponse::ok(SampleView::from(sample)),
        None => tracker_error_response(&TrackerError::NotFound(name)),
    }
}

/// POST /api/v1/samples
pub async fn start_sample(State(state): State<AppState>, Json(body): Json<StartSampleRequest>) -> Response {
    let name = body.name.trim();
    if name.is_empty() {
        return ApiErrorResponse::bad_request("sample name must not be empty");
    }
    let (seconds, computed) = match resolve_lag_seconds(&state, body.source) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    match state.tracker.start(name, seconds) {
        Ok(sample) => {
            let report = computed.map(|c| c.record(&state));
            if let Some(r) = &report {
                if r.warnings.iter().any(|w| matches!(w, CalculationWarning::Geometry(_))) {
                    warn!(sample = %name, "Sample started from a calculation with geometry warnings");
                }
            }
            ApiResponse::created(SampleResponse {
                sample: sample.into(),
                report,
            })
        }
        Err(e) => tracker_error_response(&e),
    }
}

/// POST /api/v1/samples/:name/rescale
pub async fn rescale_sample(
    State(state): State<AppState>,
    Path(name): Path<String>,
    Json(source): Json<LagSource>,
) -> Response {
    if state.tracker.get(&name).is_none() {
        return tracker_error_response(&TrackerError::NotFound(name));
    }
    let (seconds, computed) = match resolve_lag_seconds(&state, source) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    match state.tracker.rescale(&name, seconds) {
        Ok(sample) => ApiResponse::ok(SampleResponse {
            sample: sample.into(),
            report: computed.map(|c| c.record(&state)),
        }),
        Err(e) => tracker_error_response(&e),
    }
}

/// DELETE /api/v1/samples/:name
pub async fn stop_sample(State(state): State<AppState>, Path(name): Path<String>) -> Response {
    match state.tracker.stop(&name) {
        Ok(sample) => ApiResponse::ok(SampleView::from(sample)),
        Err(e) => tracker_error_response(&e),
    }
}

/// DELETE /api/v1/samples/completed
pub async fn clear_completed(State(state): State<AppState>) -> Response {
    let removed = state.tracker.clear_completed();
    ApiResponse::ok(serde_json::json!({ "removed": removed }))
}

/// GET /api/v1/history?limit=50
pub async fn history(State(state): State<AppState>, Query(q): Query<LimitQuery>) -> Response {
    let limit = q
        .limit
        .unwrap_or(defaults::HISTORY_DEFAULT_LIMIT)
        .min(defaults::HISTORY_MAX_LIMIT);
    match &state.history {
        Some(sink) => match sink.recent(limit) {
            Ok(rows) => ApiResponse::ok(rows),
            Err(e) => ApiErrorResponse::internal(format!("Storage error: {e}")),
        },
        None => ApiResponse::ok(Vec::<crate::types::CalculationRecord>::new()),
    }
}
