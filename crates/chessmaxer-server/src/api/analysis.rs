//! Analysis API endpoints.

use axum::{extract::rejection::JsonRejection, extract::State, Json};
use serde::Serialize;

use super::{payload, AppState};
use crate::adapter::{DifficultyRequest, PositionRequest};
use crate::error::AdapterError;
use crate::evaluation::Evaluation;

/// Response of `/api/move`.
#[derive(Debug, Serialize)]
pub struct MoveResponse {
    /// Best move in UCI notation.
    #[serde(rename = "move")]
    pub mv: String,
    /// Same as `move`, kept for older clients.
    pub best_move: String,
    pub depth_used: u32,
    /// `null` when the engine could not produce a score.
    pub evaluation: Option<Evaluation>,
}

/// Response of `/api/move/difficulty`.
#[derive(Debug, Serialize)]
pub struct DifficultyMoveResponse {
    #[serde(rename = "move")]
    pub mv: String,
    /// Lowercase difficulty label that was applied.
    pub difficulty: String,
    pub depth: u32,
}

/// Response of `/api/evaluate`.
#[derive(Debug, Serialize)]
pub struct EvaluateResponse {
    pub evaluation: Evaluation,
    /// `null` in a checkmate or stalemate position.
    pub best_move: Option<String>,
    pub depth: u32,
}

/// Response of `/api/valid-moves`.
#[derive(Debug, Serialize)]
pub struct ValidMovesResponse {
    pub valid_moves: Vec<String>,
    pub move_count: usize,
}

/// POST /api/move
///
/// Body: `{"fen": "...", "depth": 15}` (depth optional, default 15).
///
/// # Errors
/// * 503 Service Unavailable - engine not available
/// * 400 Bad Request - missing or invalid FEN, invalid depth, no legal move
/// * 500 Internal Server Error - engine failure
pub async fn best_move(
    State(state): State<AppState>,
    body: Result<Json<PositionRequest>, JsonRejection>,
) -> Result<Json<MoveResponse>, AdapterError> {
    let request = payload(&state, body)?;
    let analysis = state.adapter.best_move(request).await?;
    let mv = analysis.best_move.ok_or(AdapterError::NoLegalMove)?;

    Ok(Json(MoveResponse {
        best_move: mv.clone(),
        mv,
        depth_used: analysis.depth,
        evaluation: analysis.evaluation,
    }))
}

/// POST /api/move/difficulty
///
/// Body: `{"fen": "...", "difficulty": "easy|medium|hard|expert"}`
/// (difficulty optional, default medium, any case).
///
/// # Errors
/// * 503 Service Unavailable - engine not available
/// * 400 Bad Request - missing or invalid FEN, unknown difficulty, no legal move
/// * 500 Internal Server Error - engine failure
pub async fn move_by_difficulty(
    State(state): State<AppState>,
    body: Result<Json<DifficultyRequest>, JsonRejection>,
) -> Result<Json<DifficultyMoveResponse>, AdapterError> {
    let request = payload(&state, body)?;
    let (analysis, difficulty) = state.adapter.move_by_difficulty(request).await?;
    let mv = analysis.best_move.ok_or(AdapterError::NoLegalMove)?;

    Ok(Json(DifficultyMoveResponse {
        mv,
        difficulty: difficulty.to_string(),
        depth: analysis.depth,
    }))
}

/// POST /api/evaluate
///
/// Body: `{"fen": "...", "depth": 20}` (depth optional, default 20).
///
/// # Errors
/// * 503 Service Unavailable - engine not available
/// * 400 Bad Request - missing or invalid FEN, invalid depth
/// * 500 Internal Server Error - engine failure or no score reported
pub async fn evaluate(
    State(state): State<AppState>,
    body: Result<Json<PositionRequest>, JsonRejection>,
) -> Result<Json<EvaluateResponse>, AdapterError> {
    let request = payload(&state, body)?;
    let analysis = state.adapter.evaluate(request).await?;
    let evaluation = analysis
        .evaluation
        .ok_or(AdapterError::EvaluationUnavailable)?;

    Ok(Json(EvaluateResponse {
        evaluation,
        best_move: analysis.best_move,
        depth: analysis.depth,
    }))
}

/// POST /api/valid-moves
///
/// Body: `{"fen": "..."}`
///
/// # Errors
/// * 503 Service Unavailable - engine not available
/// * 400 Bad Request - missing or invalid FEN
/// * 500 Internal Server Error - engine failure
pub async fn valid_moves(
    State(state): State<AppState>,
    body: Result<Json<PositionRequest>, JsonRejection>,
) -> Result<Json<ValidMovesResponse>, AdapterError> {
    let request = payload(&state, body)?;
    let valid_moves = state.adapter.legal_moves(request).await?;

    Ok(Json(ValidMovesResponse {
        move_count: valid_moves.len(),
        valid_moves,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn move_response_serialize() {
        let response = MoveResponse {
            mv: "e2e4".to_string(),
            best_move: "e2e4".to_string(),
            depth_used: 15,
            evaluation: Some(Evaluation::Cp(35)),
        };
        let json = serde_json::to_string(&response).unwrap();
        assert!(json.contains("\"move\":\"e2e4\""));
        assert!(json.contains("\"best_move\":\"e2e4\""));
        assert!(json.contains("\"depth_used\":15"));
        assert!(json.contains("\"evaluation\":{\"type\":\"cp\",\"value\":35}"));
    }

    #[test]
    fn missing_evaluation_serializes_as_null() {
        let response = MoveResponse {
            mv: "e2e4".to_string(),
            best_move: "e2e4".to_string(),
            depth_used: 15,
            evaluation: None,
        };
        let json = serde_json::to_string(&response).unwrap();
        assert!(json.contains("\"evaluation\":null"));
    }

    #[test]
    fn position_request_deserialize() {
        let json = r#"{"fen": "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1"}"#;
        let request: PositionRequest = serde_json::from_str(json).unwrap();
        assert!(request.fen.is_some());
        assert_eq!(request.depth, None);

        let request: PositionRequest = serde_json::from_str(r#"{"depth": 12}"#).unwrap();
        assert_eq!(request.fen, None);
        assert_eq!(request.depth, Some(12));
    }

    #[test]
    fn evaluate_response_allows_missing_move() {
        let response = EvaluateResponse {
            evaluation: Evaluation::Mate(0),
            best_move: None,
            depth: 20,
        };
        let json = serde_json::to_string(&response).unwrap();
        assert!(json.contains("\"best_move\":null"));
        assert!(json.contains("\"type\":\"mate\""));
    }
}
