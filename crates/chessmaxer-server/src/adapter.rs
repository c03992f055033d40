//! Request-facing façade over the engine session pool.
//!
//! Every engine-dependent operation runs the same linear pipeline:
//!
//! 1. availability check (no session access when the engine is down)
//! 2. input validation (no session access for bad input)
//! 3. exclusive checkout of one session for the whole operation
//! 4. set position, optionally set depth, query
//!
//! The session is never reachable from outside this module except through
//! the guard in [`SessionPool::run`], and the guard is held from the first
//! `set_position` to the last query of a request. Two requests can therefore
//! never observe each other's position or depth.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use serde::Deserialize;

use crate::difficulty::{Difficulty, DEFAULT_DIFFICULTY};
use crate::error::AdapterError;
use crate::evaluation::Evaluation;
use crate::session::EngineSession;

/// Depth for `best_move` when the request names none.
pub const DEFAULT_MOVE_DEPTH: u32 = 15;

/// Depth for `evaluate` when the request names none.
pub const DEFAULT_EVALUATE_DEPTH: u32 = 20;

/// Body of `/api/move`, `/api/evaluate` and `/api/valid-moves`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PositionRequest {
    /// Position in FEN notation.
    #[serde(default)]
    pub fen: Option<String>,
    /// Search depth in plies.
    #[serde(default)]
    pub depth: Option<i64>,
}

/// Body of `/api/move/difficulty`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DifficultyRequest {
    #[serde(default)]
    pub fen: Option<String>,
    /// One of easy, medium, hard, expert (any case).
    #[serde(default)]
    pub difficulty: Option<String>,
}

/// What to do when an analysis step comes back empty or fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Policy {
    /// Fail the whole request.
    Fatal,
    /// Answer anyway, with an explicit empty value.
    Degrade,
    /// Do not perform the step.
    Skip,
}

/// The analysis operations and their failure policies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnalysisKind {
    BestMove,
    MoveByDifficulty,
    Evaluate,
}

impl AnalysisKind {
    /// Policy when the position has no legal move.
    pub const fn on_missing_move(self) -> Policy {
        match self {
            AnalysisKind::BestMove | AnalysisKind::MoveByDifficulty => Policy::Fatal,
            AnalysisKind::Evaluate => Policy::Degrade,
        }
    }

    /// Policy for the evaluation query.
    pub const fn on_evaluation_failure(self) -> Policy {
        match self {
            AnalysisKind::BestMove => Policy::Degrade,
            AnalysisKind::MoveByDifficulty => Policy::Skip,
            AnalysisKind::Evaluate => Policy::Fatal,
        }
    }
}

/// Result of one analysis operation.
#[derive(Debug, Clone, PartialEq)]
pub struct Analysis {
    /// Best move, `None` only where the policy allows it.
    pub best_move: Option<String>,
    /// Depth the search ran at.
    pub depth: u32,
    /// Evaluation, `None` when skipped or degraded.
    pub evaluation: Option<Evaluation>,
}

type SharedSession = Arc<Mutex<Box<dyn EngineSession>>>;

/// Independent sessions, each behind its own lock, handed out round-robin.
struct SessionPool {
    members: Vec<SharedSession>,
    next: AtomicUsize,
}

impl SessionPool {
    fn checkout(&self) -> SharedSession {
        let idx = self.next.fetch_add(1, Ordering::Relaxed) % self.members.len();
        Arc::clone(&self.members[idx])
    }

    /// Run `op` with exclusive access to one session.
    ///
    /// The engine I/O is blocking, so the guard lives on the blocking pool.
    async fn run<T, F>(&self, op: F) -> Result<T, AdapterError>
    where
        T: Send + 'static,
        F: FnOnce(&mut dyn EngineSession) -> Result<T, AdapterError> + Send + 'static,
    {
        let member = self.checkout();
        tokio::task::spawn_blocking(move || {
            // A panicking holder may leave position, depth or a half-read
            // reply behind. Every operation sets position and depth again,
            // and the session drains an interrupted reply before its next
            // command.
            let mut session = member.lock().unwrap_or_else(PoisonError::into_inner);
            op(session.as_mut())
        })
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "Engine task failed");
            AdapterError::Internal
        })?
    }
}

/// The engine adapter.
///
/// Availability is fixed at construction: an adapter built with
/// [`EngineAdapter::unavailable`] answers every engine-dependent operation
/// with [`AdapterError::EngineUnavailable`] for its whole lifetime.
pub struct EngineAdapter {
    pool: Option<SessionPool>,
    engine_name: Option<String>,
}

impl EngineAdapter {
    /// Build an adapter over already-initialized sessions.
    ///
    /// An empty list yields an unavailable adapter.
    pub fn new(sessions: Vec<Box<dyn EngineSession>>) -> Self {
        let Some(first) = sessions.first() else {
            return Self::unavailable();
        };
        let engine_name = first.name().to_string();
        let members = sessions
            .into_iter()
            .map(|s| Arc::new(Mutex::new(s)))
            .collect();

        Self {
            pool: Some(SessionPool {
                members,
                next: AtomicUsize::new(0),
            }),
            engine_name: Some(engine_name),
        }
    }

    /// An adapter whose engine never came up.
    pub fn unavailable() -> Self {
        Self {
            pool: None,
            engine_name: None,
        }
    }

    pub fn is_available(&self) -> bool {
        self.pool.is_some()
    }

    /// Engine name as reported by the UCI handshake.
    pub fn engine_name(&self) -> Option<&str> {
        self.engine_name.as_deref()
    }

    /// Number of independent sessions.
    pub fn pool_size(&self) -> usize {
        self.pool.as_ref().map_or(0, |p| p.members.len())
    }

    fn pool(&self) -> Result<&SessionPool, AdapterError> {
        self.pool.as_ref().ok_or(AdapterError::EngineUnavailable)
    }

    /// Best move at the requested depth (default 15), with a best-effort evaluation.
    pub async fn best_move(&self, request: PositionRequest) -> Result<Analysis, AdapterError> {
        let pool = self.pool()?;
        let fen = require_fen(request.fen)?;
        let depth = resolve_depth(request.depth, DEFAULT_MOVE_DEPTH)?;

        pool.run(move |session| analyze(session, &fen, depth, AnalysisKind::BestMove))
            .await
    }

    /// Best move at the depth a named difficulty maps to (default medium).
    pub async fn move_by_difficulty(
        &self,
        request: DifficultyRequest,
    ) -> Result<(Analysis, Difficulty), AdapterError> {
        let pool = self.pool()?;
        let fen = require_fen(request.fen)?;
        let difficulty = match request.difficulty {
            Some(label) => label
                .parse::<Difficulty>()
                .map_err(|_| AdapterError::InvalidDifficulty)?,
            None => DEFAULT_DIFFICULTY,
        };
        let depth = difficulty.depth();

        let analysis = pool
            .run(move |session| analyze(session, &fen, depth, AnalysisKind::MoveByDifficulty))
            .await?;
        Ok((analysis, difficulty))
    }

    /// Evaluation plus best move for one position/depth snapshot (default depth 20).
    pub async fn evaluate(&self, request: PositionRequest) -> Result<Analysis, AdapterError> {
        let pool = self.pool()?;
        let fen = require_fen(request.fen)?;
        let depth = resolve_depth(request.depth, DEFAULT_EVALUATE_DEPTH)?;

        pool.run(move |session| analyze(session, &fen, depth, AnalysisKind::Evaluate))
            .await
    }

    /// All legal moves of a position. Leaves the session depth alone.
    pub async fn legal_moves(&self, request: PositionRequest) -> Result<Vec<String>, AdapterError> {
        let pool = self.pool()?;
        let fen = require_fen(request.fen)?;

        pool.run(move |session| {
            session.set_position(&fen)?;
            let moves = session.legal_moves()?;
            tracing::info!(fen = %fen, count = moves.len(), "Legal moves");
            Ok(moves)
        })
        .await
    }
}

fn require_fen(fen: Option<String>) -> Result<String, AdapterError> {
    match fen {
        Some(f) if !f.trim().is_empty() => Ok(f),
        _ => Err(AdapterError::MissingInput),
    }
}

fn resolve_depth(depth: Option<i64>, default: u32) -> Result<u32, AdapterError> {
    match depth {
        None => Ok(default),
        Some(d) if d > 0 => u32::try_from(d).map_err(|_| AdapterError::InvalidDepth(d)),
        Some(d) => Err(AdapterError::InvalidDepth(d)),
    }
}

/// The shared analysis sequence. Runs under the session guard.
fn analyze(
    session: &mut dyn EngineSession,
    fen: &str,
    depth: u32,
    kind: AnalysisKind,
) -> Result<Analysis, AdapterError> {
    session.set_position(fen)?;
    session.set_search_depth(depth);

    let best_move = session.best_move()?;
    if best_move.is_none() && kind.on_missing_move() == Policy::Fatal {
        return Err(AdapterError::NoLegalMove);
    }

    let evaluation = match kind.on_evaluation_failure() {
        Policy::Skip => None,
        Policy::Fatal => Some(session.evaluate()?),
        Policy::Degrade => match session.evaluate() {
            Ok(eval) => Some(eval),
            Err(e) => {
                tracing::warn!(fen = %fen, error = %e, "Evaluation unavailable, answering without it");
                None
            }
        },
    };

    tracing::info!(
        fen = %fen,
        depth,
        best_move = best_move.as_deref().unwrap_or("(none)"),
        "Analysis complete"
    );

    Ok(Analysis {
        best_move,
        depth,
        evaluation,
    })
}
