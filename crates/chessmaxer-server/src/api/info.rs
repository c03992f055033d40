//! Engine information endpoint.

use axum::{extract::State, Json};
use serde::Serialize;

use super::{AppState, ENDPOINTS};
use crate::error::AdapterError;

#[derive(Debug, Serialize)]
pub struct InfoResponse {
    /// Name the engine reported during the UCI handshake.
    pub engine_name: String,
    pub available_endpoints: Vec<&'static str>,
}

/// GET /api/info
///
/// # Errors
/// * 503 Service Unavailable - engine did not start
pub async fn engine_info(State(state): State<AppState>) -> Result<Json<InfoResponse>, AdapterError> {
    let engine_name = state
        .adapter
        .engine_name()
        .ok_or(AdapterError::EngineUnavailable)?;

    Ok(Json(InfoResponse {
        engine_name: engine_name.to_string(),
        available_endpoints: ENDPOINTS.to_vec(),
    }))
}
