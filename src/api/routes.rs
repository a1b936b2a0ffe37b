use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use std::sync::Arc;
use std::time::Instant;
use tower_http::trace::TraceLayer;
use tracing::warn;

use crate::domain::{FilterMode, TraceId};
use crate::observability::MetricsRegistry;
use crate::projection::{ProjectionError, TranscriptProjector};

use super::request::{filter_from_query, viewer_from_headers, VIEWER_HEADER};
use super::response::{ErrorResponse, HealthResponse, TranscriptResponse};

/// Shared application state.
pub struct AppState {
    /// Transcript loading, filtering and name resolution
    pub projector: Arc<TranscriptProjector>,

    /// Metrics shared with the projector
    pub metrics: Arc<MetricsRegistry>,

    /// Application start time
    pub start_time: Instant,

    /// Application version
    pub version: String,

    /// Latency budget in milliseconds
    pub latency_budget_ms: u64,
}

/// Create the application router.
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/v1/transcript/:id", get(handle_transcript))
        .route("/v1/transcript/:id/:filter", get(handle_transcript_filtered))
        .route("/health", get(handle_health))
        .route("/metrics", get(handle_metrics))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Handle transcript requests with the filter in the query string.
async fn handle_transcript(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Query(query): Query<Vec<(String, String)>>,
    headers: HeaderMap,
) -> Response {
    project(&state, TraceId::new(id), filter_from_query(&query), &headers).await
}

/// Handle transcript requests with the filter as a path segment.
async fn handle_transcript_filtered(
    State(state): State<Arc<AppState>>,
    Path((id, filter)): Path<(String, String)>,
    headers: HeaderMap,
) -> Response {
    let mode = FilterMode::from_token(Some(filter.as_str()));
    project(&state, TraceId::new(id), mode, &headers).await
}

async fn project(state: &AppState, id: TraceId, mode: FilterMode, headers: &HeaderMap) -> Response {
    let start = Instant::now();

    let Some(viewer) = viewer_from_headers(headers) else {
        return (
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse::bad_request(format!(
                "Missing {} header",
                VIEWER_HEADER
            ))),
        )
            .into_response();
    };

    let projection = match state.projector.project(&id, mode, viewer).await {
        Ok(projection) => projection,
        Err(e @ ProjectionError::TraceNotFound(_)) => {
            return (StatusCode::NOT_FOUND, Json(ErrorResponse::not_found(e.to_string())))
                .into_response();
        }
        Err(e) => {
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse::internal_error(e.to_string())),
            )
                .into_response();
        }
    };

    let elapsed = start.elapsed();
    if elapsed.as_millis() > state.latency_budget_ms as u128 {
        warn!(
            trace_id = %id,
            latency_ms = elapsed.as_millis(),
            budget_ms = state.latency_budget_ms,
            "Transcript latency exceeded budget"
        );
    }

    (StatusCode::OK, Json(TranscriptResponse::from(projection))).into_response()
}

/// Health check endpoint.
async fn handle_health(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: state.version.clone(),
        uptime_secs: state.start_time.elapsed().as_secs(),
    })
}

/// Metrics endpoint (Prometheus format).
async fn handle_metrics(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let metrics = format!(
        r#"# HELP ruletrace_uptime_seconds Application uptime in seconds
# TYPE ruletrace_uptime_seconds counter
ruletrace_uptime_seconds {}

{}"#,
        state.start_time.elapsed().as_secs(),
        state.metrics.to_prometheus(),
    );

    (
        StatusCode::OK,
        [(
            axum::http::header::CONTENT_TYPE,
            "text/plain; charset=utf-8",
        )],
        metrics,
    )
}
