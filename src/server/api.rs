//! Caller-facing HTTP API.
//!
//! - GET /          redirect to the docs page
//! - GET /ask       generate a completion for `?prompt=`
//! - POST /pull     pull a model onto the backing server
//! - GET /health
//! - GET /metrics

use std::sync::Arc;
use std::time::Instant;

use axum::extract::{Query, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Redirect, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use tower_http::trace::TraceLayer;
use tracing::{error, info_span, warn, Instrument};
use uuid::Uuid;

use crate::metrics::RelayMetrics;
use crate::relay::{Backend, PullOutcome, RelayError};
use crate::server::docs;

/// Application state shared across handlers.
pub struct AppState {
    pub backend: Arc<dyn Backend>,
    pub metrics: RelayMetrics,
    pub docs_path: String,
    pub start_time: Instant,
}

impl AppState {
    pub fn new(backend: Arc<dyn Backend>, metrics: RelayMetrics, docs_path: impl Into<String>) -> Self {
        Self {
            backend,
            metrics,
            docs_path: docs_path.into(),
            start_time: Instant::now(),
        }
    }
}

/// Build the axum router with all API routes.
pub fn build_router(state: Arc<AppState>) -> Router {
    let docs_path = state.docs_path.clone();

    Router::new()
        .route("/", get(home))
        .route("/ask", get(ask))
        .route("/pull", post(pull))
        .route("/health", get(health))
        .route("/metrics", get(metrics))
        .route(&docs_path, get(docs::docs_page))
        .route("/openapi.json", get(docs::openapi))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

// ─── Request/Response Types ────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct AskParams {
    pub prompt: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AskResponse {
    pub response: String,
}

#[derive(Debug, Deserialize)]
pub struct PullRequest {
    pub name: String,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub uptime_secs: u64,
    pub backend: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    pub detail: String,
}

/// A caller-facing failure: status code plus a `{"detail": ...}` body.
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub detail: String,
}

impl ApiError {
    fn new(status: StatusCode, detail: impl Into<String>) -> Self {
        Self {
            status,
            detail: detail.into(),
        }
    }

    /// Timeouts map to 504, everything else upstream to 500.
    fn upstream(err: &RelayError, detail: String) -> Self {
        let status = match err {
            RelayError::Timeout(_) => StatusCode::GATEWAY_TIMEOUT,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        Self::new(status, detail)
    }

    fn from_generate(err: RelayError) -> Self {
        match err {
            RelayError::MalformedResponse => {
                Self::new(StatusCode::INTERNAL_SERVER_ERROR, err.to_string())
            }
            _ => {
                let detail = format!("Error during prompt generation: {err}");
                Self::upstream(&err, detail)
            }
        }
    }

    fn from_pull(err: RelayError) -> Self {
        let detail = match &err {
            RelayError::Status { body, .. } => format!("Failed to download model: {body}"),
            _ => format!("Error pulling model: {err}"),
        };
        Self::upstream(&err, detail)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(ErrorBody { detail: self.detail })).into_response()
    }
}

// ─── Route Handlers ────────────────────────────────────────────────────────

async fn home(State(state): State<Arc<AppState>>) -> Redirect {
    Redirect::temporary(&state.docs_path)
}

async fn ask(
    State(state): State<Arc<AppState>>,
    Query(params): Query<AskParams>,
) -> Result<Json<AskResponse>, ApiError> {
    let request_id = Uuid::new_v4().to_string();
    let span = info_span!("relay", request_id = %request_id, operation = "generate");

    let started = Instant::now();
    let result = state
        .backend
        .generate(&params.prompt)
        .instrument(span)
        .await;

    let outcome = result.as_ref().map_or_else(RelayError::outcome, |_| "success");
    state.metrics.observe("generate", outcome, started.elapsed());

    match result {
        Ok(response) => Ok(Json(AskResponse { response })),
        Err(e) => {
            error!(request_id = %request_id, error = %e, "Prompt generation failed");
            Err(ApiError::from_generate(e))
        }
    }
}

async fn pull(
    State(state): State<Arc<AppState>>,
    Json(req): Json<PullRequest>,
) -> Result<Json<PullOutcome>, ApiError> {
    let request_id = Uuid::new_v4().to_string();
    let span = info_span!("relay", request_id = %request_id, operation = "pull");

    let started = Instant::now();
    let result = state.backend.pull(&req.name).instrument(span).await;

    let outcome = result.as_ref().map_or_else(RelayError::outcome, |_| "success");
    state.metrics.observe("pull", outcome, started.elapsed());

    result.map(Json).map_err(|e| {
        error!(request_id = %request_id, model = %req.name, error = %e, "Model pull failed");
        ApiError::from_pull(e)
    })
}

async fn health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    let (status, backend) = match state.backend.ping().await {
        Ok(()) => ("ok", "reachable"),
        Err(e) => {
            warn!(error = %e, "Backing server unreachable");
            ("degraded", "unreachable")
        }
    };

    Json(HealthResponse {
        status: status.to_string(),
        uptime_secs: state.start_time.elapsed().as_secs(),
        backend: backend.to_string(),
    })
}

async fn metrics(State(state): State<Arc<AppState>>) -> Response {
    match state.metrics.render() {
        Ok(body) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
            body,
        )
            .into_response(),
        Err(e) => {
            error!(error = %e, "Failed to render metrics");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}
