//! API route table.

use axum::routing::{delete, get, post};
use axum::Router;

use super::handlers::{self, AppState};

/// Build the v1 API router.
pub fn api_routes(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::health))
        // Calculation
        .route("/lag", post(handlers::calculate_lag))
        .route("/geometry", post(handlers::resolve_geometry))
        .route("/slippage/:table", get(handlers::slippage_table))
        .route("/slippage/:table/:key", get(handlers::slippage_factor))
        // Live tracker (static segment before the parameterized route)
        .route("/samples", get(handlers::list_samples).post(handlers::start_sample))
        .route("/samples/completed", delete(handlers::clear_completed))
        .route("/samples/:name", get(handlers::get_sample).delete(handlers::stop_sample))
        .route("/samples/:name/rescale", post(handlers::rescale_sample))
        // History
        .route("/history", get(handlers::history))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use std::sync::Arc;
    use tower::ServiceExt;

    use crate::config::{LagConfig, TrackerConfig};
    use crate::storage::InMemoryHistory;
    use crate::tracker::{ManualClock, SampleTracker};

    fn create_test_state() -> AppState {
        let tracker = Arc::new(SampleTracker::new(TrackerConfig::default(), Arc::new(ManualClock::default())));
        AppState::new(LagConfig::default(), tracker, Some(Arc::new(InMemoryHistory::new())))
    }

    fn json_request(method: &str, uri: &str, body: serde_json::Value) -> Request<Body> {
        Request::builder()
            .method(method)
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn empty_request(method: &str, uri: &str) -> Request<Body> {
        Request::builder().method(method).uri(uri).body(Body::empty()).unwrap()
    }

    async fn body_json(response: axum::response::Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_health() {
        let app = api_routes(create_test_state());
        let response = app.oneshot(empty_request("GET", "/health")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let v = body_json(response).await;
        assert_eq!(v["data"]["status"], "ok");
        assert_eq!(v["data"]["history_backend"], "in-memory");
    }

    #[tokio::test]
    async fn test_slippage_lookup() {
        let app = api_routes(create_test_state());
        let response = app
            .oneshot(empty_request("GET", "/slippage/fine/synthetic_based"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let v = body_json(response).await;
        assert_eq!(v["data"]["factor"], 0.915);
        assert_eq!(v["data"]["efficiency"], "high");
    }

    #[tokio::test]
    async fn test_unknown_slippage_table_is_404() {
        let app = api_routes(create_test_state());
        let response = app.oneshot(empty_request("GET", "/slippage/medium")).await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_zero_pump_output_is_422() {
        let app = api_routes(create_test_state());
        let body = serde_json::json!({
            "geometry": { "open_hole_diameter_in": 8.5, "drill_collar_od_in": 6.5, "hole_depth_ft": 1000.0 },
            "pump_speed_spm": 0.0,
            "pump_rating_bbl_stroke": 0.1
        });
        let response = app.oneshot(json_request("POST", "/lag", body)).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
        let v = body_json(response).await;
        assert_eq!(v["error"]["code"], "UNPROCESSABLE");
    }

    #[tokio::test]
    async fn test_start_duplicate_and_stop() {
        let state = create_test_state();
        let app = api_routes(state.clone());

        let start = serde_json::json!({ "name": "A", "lag_time_seconds": 100.0 });
        let response = app.clone().oneshot(json_request("POST", "/samples", start.clone())).await.unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);

        let response = app.clone().oneshot(json_request("POST", "/samples", start)).await.unwrap();
        assert_eq!(response.status(), StatusCode::CONFLICT);

        let response = app.clone().oneshot(empty_request("DELETE", "/samples/A")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert!(state.tracker.is_empty());

        let response = app.oneshot(empty_request("DELETE", "/samples/A")).await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_start_without_lag_source_is_400() {
        let app = api_routes(create_test_state());
        let response = app
            .oneshot(json_request("POST", "/samples", serde_json::json!({ "name": "A" })))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_rescale_in_minutes() {
        let state = create_test_state();
        state.tracker.start("A", 100.0).unwrap();
        state.tracker.tick(50.0);

        let app = api_routes(state.clone());
        let response = app
            .oneshot(json_request(
                "POST",
                "/samples/A/rescale",
                serde_json::json!({ "lag_time_minutes": 4.0 }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let sample = state.tracker.get("A").unwrap();
        assert_eq!(sample.lag_time_seconds, 240.0);
        assert_eq!(sample.remaining_time_seconds, 120.0);
    }

    #[tokio::test]
    async fn test_clear_completed_not_captured_by_name_route() {
        let state = create_test_state();
        state.tracker.start("A", 10.0).unwrap();
        state.tracker.start("completed", 100.0).unwrap();
        state.tracker.tick(10.0);

        let app = api_routes(state.clone());
        let response = app.oneshot(empty_request("DELETE", "/samples/completed")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await["data"]["removed"], 1);
        assert!(state.tracker.get("completed").is_some());
    }

    #[tokio::test]
    async fn test_history_limit() {
        let app = api_routes(create_test_state());
        let response = app.oneshot(empty_request("GET", "/history?limit=5")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert!(body_json(response).await["data"].as_array().unwrap().is_empty());
    }
}
