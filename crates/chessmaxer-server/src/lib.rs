//! CHESSMAXER analysis server.
//!
//! Exposes a UCI chess engine (normally Stockfish) as a small JSON API:
//! best move, best move by named difficulty, evaluation, and legal moves
//! for a FEN position.
//!
//! # Overview
//!
//! - [`session`] - [`EngineSession`](session::EngineSession) trait and the
//!   subprocess-backed [`UciSession`](session::UciSession)
//! - [`adapter`] - [`EngineAdapter`](adapter::EngineAdapter): validation,
//!   exclusive session access per request, failure policy
//! - [`difficulty`] - named difficulty levels and their depths
//! - [`lifecycle`] - locating and starting the engine at boot
//! - [`api`] - axum router and handlers

pub mod adapter;
pub mod api;
pub mod config;
pub mod difficulty;
pub mod error;
pub mod evaluation;
pub mod lifecycle;
pub mod middleware;
pub mod session;

pub use adapter::EngineAdapter;
pub use error::AdapterError;
pub use evaluation::Evaluation;
