//! HTTP fieldbus endpoint.
//!
//! The OPC-UA transport is out of scope; this surface is its stand-in. It
//! exposes the flat variable tree for reading and writing plus a couple of
//! inspection routes. Handlers are thin wrappers around the `Cell` — the
//! protocol semantics (which writes are honored, which are reverted) live in
//! the core, so a write here is simply a fieldbus write.

use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use serde::Deserialize;
use tokio::sync::Mutex;

use liftcell_core::{Cell, CellError, Value};

#[derive(Clone)]
pub struct AppState {
    pub cell: Arc<Mutex<Cell>>,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/status", get(status))
        .route("/events", get(events))
        .route("/vars", get(list_vars))
        .route("/vars/*path", get(read_var).put(write_var))
        .layer(tower_http::trace::TraceLayer::new_for_http())
        .with_state(state)
}

async fn status(State(state): State<AppState>) -> impl IntoResponse {
    let cell = state.cell.lock().await;
    Json(cell.snapshot())
}

#[derive(Deserialize)]
struct EventsQuery {
    #[serde(default)]
    from: u64,
}

async fn events(State(state): State<AppState>, Query(q): Query<EventsQuery>) -> impl IntoResponse {
    let cell = state.cell.lock().await;
    Json(cell.events().read_from(q.from))
}

async fn list_vars(State(state): State<AppState>) -> impl IntoResponse {
    let cell = state.cell.lock().await;
    Json(cell.vars().dump())
}

async fn read_var(
    State(state): State<AppState>,
    Path(path): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let cell = state.cell.lock().await;
    Ok(Json(cell.vars().read(&path)?.clone()))
}

async fn write_var(
    State(state): State<AppState>,
    Path(path): Path<String>,
    Json(value): Json<Value>,
) -> Result<StatusCode, ApiError> {
    let mut cell = state.cell.lock().await;
    cell.vars_mut().write(&path, value)?;
    Ok(StatusCode::NO_CONTENT)
}

pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl From<CellError> for ApiError {
    fn from(err: CellError) -> Self {
        let status = match &err {
            CellError::UnknownPath(_) => StatusCode::NOT_FOUND,
            CellError::TypeMismatch { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        Self {
            status,
            message: err.to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, self.message).into_response()
    }
}
