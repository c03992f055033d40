//! HTTP surface of the analysis server.

pub mod analysis;
pub mod health;
pub mod info;

use std::any::Any;
use std::sync::Arc;

use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    middleware,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde_json::json;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::cors::{Any as AnyOrigin, CorsLayer};

use crate::adapter::EngineAdapter;
use crate::error::AdapterError;
use crate::middleware::timing_layer;

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    /// The engine adapter. Its availability never changes after startup.
    pub adapter: Arc<EngineAdapter>,
}

impl AppState {
    pub fn new(adapter: EngineAdapter) -> Self {
        Self {
            adapter: Arc::new(adapter),
        }
    }
}

/// Every route the server answers, as listed by `/api/info`.
pub const ENDPOINTS: [&str; 6] = [
    "/api/health",
    "/api/move",
    "/api/move/difficulty",
    "/api/evaluate",
    "/api/valid-moves",
    "/api/info",
];

/// Build the application router.
pub fn router(state: AppState) -> Router {
    // CORS layer for the browser frontend
    let cors = CorsLayer::new()
        .allow_origin(AnyOrigin)
        .allow_methods(AnyOrigin)
        .allow_headers(AnyOrigin);

    Router::new()
        .route("/api/health", get(health::health))
        .route("/api/move", post(analysis::best_move))
        .route("/api/move/difficulty", post(analysis::move_by_difficulty))
        .route("/api/evaluate", post(analysis::evaluate))
        .route("/api/valid-moves", post(analysis::valid_moves))
        .route("/api/info", get(info::engine_info))
        .fallback(not_found)
        .with_state(state)
        .layer(middleware::from_fn(timing_layer))
        .layer(CatchPanicLayer::custom(internal_error))
        .layer(cors)
}

async fn not_found() -> Response {
    (
        StatusCode::NOT_FOUND,
        Json(json!({ "error": "Endpoint not found" })),
    )
        .into_response()
}

fn internal_error(_panic: Box<dyn Any + Send + 'static>) -> Response {
    tracing::error!("Handler panicked");
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({ "error": "Internal server error" })),
    )
        .into_response()
}

/// Unwrap a JSON body for an engine-dependent endpoint.
///
/// Availability is checked first so a down engine answers 503 no matter
/// what the body looks like. Extractor rejections become a 400.
pub(crate) fn payload<T>(
    state: &AppState,
    body: Result<Json<T>, JsonRejection>,
) -> Result<T, AdapterError> {
    if !state.adapter.is_available() {
        return Err(AdapterError::EngineUnavailable);
    }
    body.map(|Json(value)| value)
        .map_err(|rejection| AdapterError::MalformedRequest(rejection.body_text()))
}
