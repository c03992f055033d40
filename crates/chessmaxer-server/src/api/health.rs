//! Liveness endpoint.

use axum::{extract::State, Json};
use serde::Serialize;

use super::AppState;

/// Name this backend reports in health checks.
pub const BACKEND_NAME: &str = "CHESSMAXER Rust Backend";

/// Health check response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    /// Whether the engine came up at startup.
    pub stockfish_available: bool,
    pub backend: &'static str,
}

/// GET /api/health
///
/// Always succeeds, whether or not the engine is available.
pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        stockfish_available: state.adapter.is_available(),
        backend: BACKEND_NAME,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapter::EngineAdapter;

    #[tokio::test]
    async fn health_reports_unavailable_engine() {
        let state = AppState::new(EngineAdapter::unavailable());
        let Json(response) = health(State(state)).await;
        assert_eq!(response.status, "healthy");
        assert!(!response.stockfish_available);
        assert_eq!(response.backend, BACKEND_NAME);
    }

    #[test]
    fn health_response_serialize() {
        let response = HealthResponse {
            status: "healthy",
            stockfish_available: true,
            backend: BACKEND_NAME,
        };
        let json = serde_json::to_string(&response).unwrap();
        assert!(json.contains("\"status\":\"healthy\""));
        assert!(json.contains("\"stockfish_available\":true"));
    }
}
