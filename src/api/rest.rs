// =============================================================================
// REST API Endpoints — Axum 0.7
// =============================================================================
//
// All endpoints live under `/api/v1/`. A client opens a session, then drives
// it with timeframe selections and symbol changes. A selection answers with
// the annotated series right away on a cache hit; otherwise the client polls
// the session status until the series is ready.
//
// CORS is configured permissively for development.
// =============================================================================

use std::sync::Arc;

use axum::{
    extract::{Json, Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use serde::{Deserialize, Serialize};
use tower_http::cors::{Any, CorsLayer};
use tracing::info;
use uuid::Uuid;

use crate::app_state::AppState;
use crate::indicators::AnnotatedSeries;
use crate::session::{ChartSession, Selection, SessionStatus};
use crate::types::Timeframe;

type ApiError = (StatusCode, Json<serde_json::Value>);

fn api_error(status: StatusCode, message: impl Into<String>) -> ApiError {
    (status, Json(serde_json::json!({ "error": message.into() })))
}

// =============================================================================
// Router construction
// =============================================================================

/// Build the full REST API router with CORS middleware and shared state.
pub fn router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/api/v1/health", get(health))
        .route("/api/v1/sessions", post(create_session))
        .route("/api/v1/sessions/:id", axum::routing::delete(close_session))
        .route("/api/v1/sessions/:id/status", get(session_status))
        .route("/api/v1/sessions/:id/select", post(select_timeframe))
        .route("/api/v1/sessions/:id/symbol", post(change_symbol))
        .route("/api/v1/sessions/:id/retry", post(retry))
        .layer(cors)
        .with_state(state)
}

fn lookup(state: &AppState, id: Uuid) -> Result<Arc<ChartSession>, ApiError> {
    state
        .session(&id)
        .ok_or_else(|| api_error(StatusCode::NOT_FOUND, format!("session {id} not found")))
}

fn parse_symbol(symbol: &str) -> Result<&str, ApiError> {
    let symbol = symbol.trim();
    if symbol.is_empty() || !symbol.chars().all(|c| c.is_ascii_alphanumeric() || "-_.".contains(c)) {
        return Err(api_error(
            StatusCode::BAD_REQUEST,
            format!("invalid symbol '{symbol}'"),
        ));
    }
    Ok(symbol)
}

// =============================================================================
// Responses
// =============================================================================

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    provider: &'static str,
    sessions: usize,
    state_version: u64,
    server_time: i64,
}

/// Session status plus the active series when there is one to render.
#[derive(Serialize)]
struct SessionView<'a> {
    cached: bool,
    status: SessionStatus,
    series: Option<&'a AnnotatedSeries>,
}

fn selection_response(session: &ChartSession, selection: &Selection) -> Response {
    let view = SessionView {
        cached: selection.is_cached(),
        status: session.status(),
        series: selection.entry().map(|entry| &entry.series),
    };
    let code = if selection.is_cached() {
        StatusCode::OK
    } else {
        StatusCode::ACCEPTED
    };
    (code, Json(view)).into_response()
}

// =============================================================================
// Health
// =============================================================================

async fn health(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(HealthResponse {
        status: "ok",
        provider: state.provider_name(),
        sessions: state.session_count(),
        state_version: state.current_state_version(),
        server_time: chrono::Utc::now().timestamp_millis(),
    })
}

// =============================================================================
// Session lifecycle
// =============================================================================

#[derive(Serialize)]
struct CreatedResponse {
    session_id: Uuid,
    status: SessionStatus,
}

async fn create_session(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let session = state.create_session();
    (
        StatusCode::CREATED,
        Json(CreatedResponse {
            session_id: session.id(),
            status: session.status(),
        }),
    )
}

async fn close_session(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    if state.close_session(&id) {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(api_error(StatusCode::NOT_FOUND, format!("session {id} not found")))
    }
}

async fn session_status(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Response, ApiError> {
    let session = lookup(&state, id)?;
    let active = session.active();
    let status = session.status();
    let view = SessionView {
        cached: status.from_cache,
        status,
        series: active.as_ref().map(|entry| &entry.series),
    };
    Ok(Json(view).into_response())
}

// =============================================================================
// Selection
// =============================================================================

#[derive(Deserialize)]
struct SelectRequest {
    symbol: String,
    timeframe: String,
}

async fn select_timeframe(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(req): Json<SelectRequest>,
) -> Result<Response, ApiError> {
    let session = lookup(&state, id)?;
    let symbol = parse_symbol(&req.symbol)?;
    let timeframe: Timeframe = req
        .timeframe
        .parse()
        .map_err(|e| api_error(StatusCode::BAD_REQUEST, format!("{e}")))?;

    let selection = session.select(symbol, timeframe);
    Ok(selection_response(&session, &selection))
}

#[derive(Deserialize)]
struct SymbolRequest {
    symbol: String,
}

async fn change_symbol(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(req): Json<SymbolRequest>,
) -> Result<Response, ApiError> {
    let session = lookup(&state, id)?;
    let symbol = parse_symbol(&req.symbol)?;
    info!(session_id = %id, symbol, "symbol change requested via API");

    let selection = session.on_symbol_changed(symbol);
    Ok(selection_response(&session, &selection))
}

async fn retry(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Response, ApiError> {
    let session = lookup(&state, id)?;
    match session.retry() {
        Some(selection) => Ok(selection_response(&session, &selection)),
        None => Err(api_error(
            StatusCode::CONFLICT,
            "nothing to retry: no retryable failure on this session",
        )),
    }
}
