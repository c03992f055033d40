//! Shared helpers for the integration tests.
//!
//! [`BoardSession`] stands in for a real engine: it tracks the position with
//! `cozy-chess`, answers with legal moves only, and can be slowed down to
//! widen any window in which two requests could interleave.

#![allow(dead_code)]

use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use chessmaxer_server::api::{self, AppState};
use chessmaxer_server::session::{EngineSession, SessionError};
use chessmaxer_server::{EngineAdapter, Evaluation};
use cozy_chess::{Board, File, Piece, Square};
use http_body_util::BodyExt;
use serde_json::Value;
use tower::ServiceExt;

pub const START_FEN: &str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";
pub const AFTER_E4_FEN: &str = "rnbqkbnr/pppppppp/8/8/4P3/8/PPPP1PPP/RNBQKBNR b KQkq e3 0 1";
pub const KIWIPETE_FEN: &str =
    "r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq - 0 1";
pub const ENDGAME_FEN: &str = "8/2p5/3p4/KP5r/1R3p1k/8/4P1P1/8 w - - 0 1";
pub const STALEMATE_FEN: &str = "7k/5Q2/6K1/8/8/8/8/8 b - - 0 1";
pub const CHECKMATE_FEN: &str = "rnb1kbnr/pppp1ppp/8/4p3/6Pq/5P2/PPPPP2P/RNBQKBNR w KQkq - 1 3";

/// Legal moves of `fen` in coordinate notation, castling as king moves.
pub fn legal_moves_of(fen: &str) -> Vec<String> {
    let board = Board::from_fen(fen, false).expect("test FEN should be valid");
    legal_moves(&board)
}

fn legal_moves(board: &Board) -> Vec<String> {
    let mut moves = Vec::new();
    board.generate_moves(|piece_moves| {
        for mv in piece_moves {
            moves.push(coordinate(board, mv));
        }
        false
    });
    moves.sort();
    moves
}

/// cozy-chess encodes castling as "king takes own rook"; UCI wants e1g1.
fn coordinate(board: &Board, mv: cozy_chess::Move) -> String {
    let castles = board.piece_on(mv.from) == Some(Piece::King)
        && board.color_on(mv.to) == Some(board.side_to_move());
    if castles {
        let file = if (mv.to.file() as u8) > (mv.from.file() as u8) {
            File::G
        } else {
            File::C
        };
        return format!("{}{}", mv.from, Square::new(file, mv.from.rank()));
    }
    mv.to_string()
}

/// In-process engine double backed by a move generator.
///
/// - best move: first legal move in sorted order
/// - evaluation: centipawns equal to the number of legal moves, so every
///   answer identifies the position it was computed for
pub struct BoardSession {
    board: Option<Board>,
    depth: u32,
    delay: Duration,
    fail_evaluation: bool,
    depths: Arc<Mutex<Vec<u32>>>,
}

impl BoardSession {
    pub fn new() -> Self {
        Self {
            board: None,
            depth: 15,
            delay: Duration::ZERO,
            fail_evaluation: false,
            depths: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Sleep after every position change.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Make every evaluation fail.
    pub fn failing_evaluation(mut self) -> Self {
        self.fail_evaluation = true;
        self
    }

    /// Log of every depth set on this session.
    pub fn depth_log(&self) -> Arc<Mutex<Vec<u32>>> {
        Arc::clone(&self.depths)
    }

    fn board(&self) -> Result<&Board, SessionError> {
        self.board.as_ref().ok_or(SessionError::NoPosition)
    }
}

impl EngineSession for BoardSession {
    fn name(&self) -> &str {
        "BoardSession"
    }

    fn set_position(&mut self, fen: &str) -> Result<(), SessionError> {
        let board = Board::from_fen(fen.trim(), false)
            .map_err(|e| SessionError::InvalidPosition(format!("{:?}", e)))?;
        self.board = Some(board);
        if !self.delay.is_zero() {
            thread::sleep(self.delay);
        }
        Ok(())
    }

    fn set_search_depth(&mut self, depth: u32) {
        self.depth = depth;
        self.depths.lock().unwrap().push(depth);
    }

    fn best_move(&mut self) -> Result<Option<String>, SessionError> {
        Ok(legal_moves(self.board()?).into_iter().next())
    }

    fn evaluate(&mut self) -> Result<Evaluation, SessionError> {
        if self.fail_evaluation {
            return Err(SessionError::NoEvaluation);
        }
        let board = self.board()?;
        let count = legal_moves(board).len();
        if count == 0 && !board.checkers().is_empty() {
            return Ok(Evaluation::Mate(0));
        }
        Ok(Evaluation::Cp(count as i32))
    }

    fn legal_moves(&mut self) -> Result<Vec<String>, SessionError> {
        Ok(legal_moves(self.board()?))
    }
}

pub fn app_with(sessions: Vec<BoardSession>) -> Router {
    let sessions = sessions
        .into_iter()
        .map(|s| Box::new(s) as Box<dyn EngineSession>)
        .collect();
    api::router(AppState::new(EngineAdapter::new(sessions)))
}

pub fn available_app() -> Router {
    app_with(vec![BoardSession::new()])
}

pub fn unavailable_app() -> Router {
    api::router(AppState::new(EngineAdapter::unavailable()))
}

async fn send(app: Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, value)
}

pub async fn get(app: &Router, uri: &str) -> (StatusCode, Value) {
    let request = Request::builder().uri(uri).body(Body::empty()).unwrap();
    send(app.clone(), request).await
}

pub async fn post_json(app: &Router, uri: &str, body: Value) -> (StatusCode, Value) {
    post_raw(app, uri, "application/json", body.to_string()).await
}

pub async fn post_raw(
    app: &Router,
    uri: &str,
    content_type: &str,
    body: String,
) -> (StatusCode, Value) {
    let request = Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", content_type)
        .body(Body::from(body))
        .unwrap();
    send(app.clone(), request).await
}
