//! Request-level error taxonomy and its HTTP mapping.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::session::SessionError;

/// Every way an adapter operation can fail.
///
/// Display strings are what clients see in the `error` field. Raw engine
/// output never appears in them.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AdapterError {
    /// The engine was not available at startup.
    #[error("Stockfish engine not available")]
    EngineUnavailable,
    /// The request did not carry a FEN.
    #[error("FEN position required")]
    MissingInput,
    /// The FEN was rejected by the session.
    #[error("Invalid FEN position: {0}")]
    InvalidPosition(String),
    /// Depth was zero, negative, or too large.
    #[error("Depth must be a positive integer, got {0}")]
    InvalidDepth(i64),
    /// Difficulty label outside the table.
    #[error("Invalid difficulty level")]
    InvalidDifficulty,
    /// The body could not be read as the expected JSON object.
    #[error("Malformed request: {0}")]
    MalformedRequest(String),
    /// Terminal position where a move was required.
    #[error("No legal moves available")]
    NoLegalMove,
    /// The engine produced no score where one was required.
    #[error("Evaluation unavailable")]
    EvaluationUnavailable,
    /// Anything unanticipated while talking to the engine.
    #[error("Internal server error")]
    Internal,
}

impl AdapterError {
    pub fn status(&self) -> StatusCode {
        match self {
            AdapterError::EngineUnavailable => StatusCode::SERVICE_UNAVAILABLE,
            AdapterError::MissingInput
            | AdapterError::InvalidPosition(_)
            | AdapterError::InvalidDepth(_)
            | AdapterError::InvalidDifficulty
            | AdapterError::MalformedRequest(_)
            | AdapterError::NoLegalMove => StatusCode::BAD_REQUEST,
            AdapterError::EvaluationUnavailable | AdapterError::Internal => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl From<SessionError> for AdapterError {
    fn from(err: SessionError) -> Self {
        match err {
            SessionError::InvalidPosition(detail) => AdapterError::InvalidPosition(detail),
            SessionError::NoEvaluation => AdapterError::EvaluationUnavailable,
            other => {
                tracing::error!(error = %other, "Engine session failure");
                AdapterError::Internal
            }
        }
    }
}

impl IntoResponse for AdapterError {
    fn into_response(self) -> Response {
        (self.status(), Json(json!({ "error": self.to_string() }))).into_response()
    }
}
