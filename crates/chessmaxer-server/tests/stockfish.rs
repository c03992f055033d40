//! Tests against a real Stockfish binary on PATH.
//!
//! Run with `cargo test -- --ignored` on a machine with Stockfish installed.

mod common;

use axum::http::StatusCode;
use chessmaxer_server::api::{self, AppState};
use chessmaxer_server::config::EngineConfig;
use chessmaxer_server::lifecycle;
use common::*;
use serde_json::json;

fn stockfish_app() -> axum::Router {
    let adapter = lifecycle::start(&EngineConfig::default());
    assert!(adapter.is_available(), "Stockfish should be on PATH");
    api::router(AppState::new(adapter))
}

#[tokio::test]
#[ignore = "requires Stockfish"]
async fn stockfish_plays_legal_moves() {
    let app = stockfish_app();

    for fen in [START_FEN, AFTER_E4_FEN, KIWIPETE_FEN, ENDGAME_FEN] {
        let (status, body) = post_json(&app, "/api/move", json!({ "fen": fen, "depth": 6 })).await;
        assert_eq!(status, StatusCode::OK);
        let mv = body["move"].as_str().unwrap().to_string();
        assert!(legal_moves_of(fen).contains(&mv), "{} in {}", mv, fen);
        assert!(body["evaluation"].is_object());
    }
}

#[tokio::test]
#[ignore = "requires Stockfish"]
async fn stockfish_move_lists_match_move_generator() {
    let app = stockfish_app();

    for fen in [START_FEN, KIWIPETE_FEN, ENDGAME_FEN, STALEMATE_FEN, CHECKMATE_FEN] {
        let (status, body) = post_json(&app, "/api/valid-moves", json!({ "fen": fen })).await;
        assert_eq!(status, StatusCode::OK);
        let mut moves: Vec<String> = serde_json::from_value(body["valid_moves"].clone()).unwrap();
        moves.sort();
        assert_eq!(moves, legal_moves_of(fen), "{}", fen);
    }
}

#[tokio::test]
#[ignore = "requires Stockfish"]
async fn stockfish_reports_mate() {
    let app = stockfish_app();

    let (status, body) = post_json(&app, "/api/evaluate", json!({ "fen": CHECKMATE_FEN, "depth": 4 })).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["best_move"].is_null());
    assert_eq!(body["evaluation"]["type"], "mate");
}
