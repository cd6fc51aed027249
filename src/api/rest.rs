// =============================================================================
// Chart Handoff API — Axum 0.7
// =============================================================================
//
// Read-only JSON endpoints under `/api/v1/` from which the browser-side
// renderer pulls chart specifications. Nothing here triggers a fetch; every
// handler serves whatever the refresh task last published.
//
// CORS is configured permissively so a renderer on another origin can poll.
// =============================================================================

use std::sync::Arc;

use axum::{
    extract::{Json, Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use tower_http::cors::{Any, CorsLayer};

use crate::app_state::{AppState, CycleStats, ErrorRecord};
use crate::charts::ChartBundle;
use crate::indicators::IndicatorSet;
use crate::market_data::MarketSeries;

// =============================================================================
// Router construction
// =============================================================================

/// Build the handoff API router with CORS middleware and shared state.
pub fn router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/api/v1/health", get(health))
        .route("/api/v1/charts", get(charts))
        .route("/api/v1/series", get(series))
        .route("/api/v1/indicators/:name", get(indicator))
        .route("/api/v1/status", get(status))
        .layer(cors)
        .with_state(state)
}

/// 503 body returned until the first cycle succeeds.
fn not_ready() -> Response {
    let body = serde_json::json!({
        "error": "no data yet",
        "message": "The first refresh cycle has not completed successfully",
    });
    (StatusCode::SERVICE_UNAVAILABLE, Json(body)).into_response()
}

// =============================================================================
// Health
// =============================================================================

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    state_version: u64,
    server_time: i64,
    has_snapshot: bool,
    uptime_secs: u64,
}

async fn health(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let resp = HealthResponse {
        status: "ok",
        state_version: state.current_state_version(),
        server_time: Utc::now().timestamp_millis(),
        has_snapshot: state.latest_snapshot().is_some(),
        uptime_secs: state.start_time.elapsed().as_secs(),
    };
    Json(resp)
}

// =============================================================================
// Charts
// =============================================================================

#[derive(Serialize)]
struct ChartsResponse<'a> {
    symbol: &'a str,
    generated_at: DateTime<Utc>,
    tick: u64,
    /// True when the latest cycle failed and these are the previous charts.
    stale: bool,
    charts: &'a ChartBundle,
}

async fn charts(State(state): State<Arc<AppState>>) -> Response {
    let Some((snapshot, stale)) = state.served_snapshot() else {
        return not_ready();
    };

    let resp = ChartsResponse {
        symbol: &snapshot.symbol,
        generated_at: snapshot.generated_at,
        tick: snapshot.tick,
        stale,
        charts: &snapshot.charts,
    };
    Json(resp).into_response()
}

// =============================================================================
// Raw series + indicators
// =============================================================================

#[derive(Serialize)]
struct SeriesResponse<'a> {
    symbol: &'a str,
    generated_at: DateTime<Utc>,
    stale: bool,
    series: &'a MarketSeries,
    indicators: &'a IndicatorSet,
}

async fn series(State(state): State<Arc<AppState>>) -> Response {
    let Some((snapshot, stale)) = state.served_snapshot() else {
        return not_ready();
    };

    let resp = SeriesResponse {
        symbol: &snapshot.symbol,
        generated_at: snapshot.generated_at,
        stale,
        series: &snapshot.series,
        indicators: &snapshot.indicators,
    };
    Json(resp).into_response()
}

// =============================================================================
// Single indicator by name (`MA_10`, `VWAP`, ...)
// =============================================================================

#[derive(Serialize)]
struct IndicatorResponse<'a> {
    symbol: &'a str,
    name: &'a str,
    stale: bool,
    dates: Vec<NaiveDate>,
    values: &'a [Option<f64>],
}

async fn indicator(State(state): State<Arc<AppState>>, Path(name): Path<String>) -> Response {
    let Some((snapshot, stale)) = state.served_snapshot() else {
        return not_ready();
    };

    let Some(values) = snapshot.indicators.get(&name) else {
        let body = serde_json::json!({
            "error": "unknown indicator",
            "name": name,
            "available": snapshot.indicators.names(),
        });
        return (StatusCode::NOT_FOUND, Json(body)).into_response();
    };

    let resp = IndicatorResponse {
        symbol: &snapshot.symbol,
        name: &name,
        stale,
        dates: snapshot.series.dates(),
        values,
    };
    Json(resp).into_response()
}

// =============================================================================
// Cycle status + error log
// =============================================================================

#[derive(Serialize)]
struct StatusResponse {
    state_version: u64,
    cycle_in_flight: bool,
    stats: CycleStats,
    recent_errors: Vec<ErrorRecord>,
}

async fn status(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(StatusResponse {
        state_version: state.current_state_version(),
        cycle_in_flight: state.cycle_in_flight(),
        stats: state.stats(),
        recent_errors: state.recent_errors(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::Request;
    use tower::ServiceExt;

    use crate::app_state::tests::sample_snapshot;

    async fn get_json(state: Arc<AppState>, uri: &str) -> (StatusCode, serde_json::Value) {
        let resp = router(state)
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = resp.status();
        let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn charts_unavailable_before_first_success() {
        let state = Arc::new(AppState::new());
        let (status, body) = get_json(state.clone(), "/api/v1/charts").await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(body["error"], "no data yet");

        let (status, _) = get_json(state, "/api/v1/series").await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    }

    #[tokio::test]
    async fn charts_served_and_flagged_stale_after_failure() {
        let state = Arc::new(AppState::new());
        state.publish_snapshot(sample_snapshot(3), 5);

        let (status, body) = get_json(state.clone(), "/api/v1/charts").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["symbol"], "AAPL");
        assert_eq!(body["tick"], 3);
        assert_eq!(body["stale"], false);
        assert_eq!(body["charts"]["market_trends"]["title"], "Market Trends");
        assert_eq!(body["charts"]["vwap"]["lines"][0]["name"], "VWAP");

        state.record_failure(4, "network failure: timeout".into(), "NETWORK_FAILURE", 1);
        let (_, body) = get_json(state, "/api/v1/charts").await;
        assert_eq!(body["stale"], true);
        assert_eq!(body["tick"], 3);
    }

    #[tokio::test]
    async fn series_exposes_records_and_indicators() {
        let state = Arc::new(AppState::new());
        state.publish_snapshot(sample_snapshot(0), 5);

        let (status, body) = get_json(state, "/api/v1/series").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["series"]["records"][0]["close_price"], 10.0);
        assert_eq!(body["indicators"]["MA_2"], serde_json::json!([null, 15.0]));
        assert_eq!(body["indicators"]["VWAP"], serde_json::json!([10.0, 15.0]));
    }

    #[tokio::test]
    async fn indicator_lookup_by_name() {
        let state = Arc::new(AppState::new());
        let (status, _) = get_json(state.clone(), "/api/v1/indicators/VWAP").await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);

        state.publish_snapshot(sample_snapshot(0), 5);

        let (status, body) = get_json(state.clone(), "/api/v1/indicators/MA_2").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["name"], "MA_2");
        assert_eq!(body["dates"], serde_json::json!(["2024-06-03", "2024-06-04"]));
        assert_eq!(body["values"], serde_json::json!([null, 15.0]));

        let (status, body) = get_json(state, "/api/v1/indicators/MA_7").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["available"], serde_json::json!(["MA_2", "VWAP"]));
    }

    #[tokio::test]
    async fn health_and_status_report_state() {
        let state = Arc::new(AppState::new());
        state.record_failure(0, "market data unavailable for AAPL: Note".into(), "DATA_UNAVAILABLE", 1);

        let (status, body) = get_json(state.clone(), "/api/v1/health").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
        assert_eq!(body["has_snapshot"], false);

        let (_, body) = get_json(state, "/api/v1/status").await;
        assert_eq!(body["stats"]["failed"], 1);
        assert_eq!(body["recent_errors"][0]["code"], "DATA_UNAVAILABLE");
        assert_eq!(body["cycle_in_flight"], false);
    }
}
