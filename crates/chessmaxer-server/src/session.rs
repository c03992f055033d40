//! Stateful handle to one external UCI engine.
//!
//! The engine keeps a current position and a current search depth. Both
//! persist across calls until overwritten, so a session must never be
//! shared between requests without an exclusive guard around the whole
//! "set position, set depth, query" sequence (see [`crate::adapter`]).

use std::collections::BTreeMap;
use std::ffi::OsStr;
use std::io::BufReader;
use std::process::{Child, ChildStdin, ChildStdout, Command, Stdio};

use cozy_chess::{Board, Color};
use thiserror::Error;
use uci::{EngineMessage, GoOptions, GuiCommand, UciError, UciTransport};

use crate::evaluation::Evaluation;

/// Maximum number of lines to read before giving up on a handshake reply.
pub const MAX_UCI_LINES: usize = 1000;

/// Depth used by a fresh session until the caller sets one.
pub const INITIAL_DEPTH: u32 = 15;

/// Errors that can occur while driving an engine session.
#[derive(Error, Debug)]
pub enum SessionError {
    /// The FEN string was rejected before reaching the engine.
    #[error("{0}")]
    InvalidPosition(String),
    /// A query was made before any position was set.
    #[error("No position set")]
    NoPosition,
    /// The search finished without reporting an exact score.
    #[error("Engine reported no evaluation")]
    NoEvaluation,
    /// Failed to spawn the engine process.
    #[error("Failed to spawn engine: {0}")]
    Spawn(#[source] std::io::Error),
    /// Engine failed to initialize properly (UCI handshake failed).
    #[error("Engine initialization failed")]
    InitFailed,
    /// Communication with the engine broke down.
    #[error("Engine communication failed: {0}")]
    Uci(#[from] UciError),
}

/// The command/response surface of an analysis engine.
///
/// Every method reads or mutates state that lives inside the engine, so
/// none of them may interleave across logical requests.
pub trait EngineSession: Send {
    /// The engine's self-reported name.
    fn name(&self) -> &str;

    /// Validate `fen` and make it the current position.
    fn set_position(&mut self, fen: &str) -> Result<(), SessionError>;

    /// Set the depth for subsequent searches. Positivity is the caller's job.
    fn set_search_depth(&mut self, depth: u32);

    /// Top move for the current position and depth, `None` in a terminal position.
    fn best_move(&mut self) -> Result<Option<String>, SessionError>;

    /// Score of the current position at the current depth.
    fn evaluate(&mut self) -> Result<Evaluation, SessionError>;

    /// Every legal move of the current position. Empty in a terminal position.
    fn legal_moves(&mut self) -> Result<Vec<String>, SessionError>;
}

/// Validated position as the session tracks it.
#[derive(Debug, Clone)]
struct CurrentPosition {
    fen: String,
    side_to_move: Color,
}

/// A command whose reply has not been read to its last line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Pending {
    /// `go depth`, ends with `bestmove`.
    Search,
    /// `go perft`, ends with `Nodes searched`.
    Perft,
}

/// Outcome of one `go depth` run, cached until position or depth change.
#[derive(Debug, Clone)]
struct SearchOutcome {
    best_move: Option<String>,
    evaluation: Option<Evaluation>,
}

/// Parse and validate a FEN string, returning the side to move.
pub fn validate_fen(fen: &str) -> Result<Color, SessionError> {
    Board::from_fen(fen.trim(), false)
        .map(|board| board.side_to_move())
        .map_err(|e| SessionError::InvalidPosition(format!("{:?}", e)))
}

/// Session backed by an engine subprocess speaking UCI over stdin/stdout.
pub struct UciSession {
    process: Child,
    transport: UciTransport<BufReader<ChildStdout>, ChildStdin>,
    name: String,
    position: Option<CurrentPosition>,
    depth: u32,
    last_search: Option<SearchOutcome>,
    pending: Option<Pending>,
}

impl UciSession {
    /// Spawn the engine and complete the UCI handshake.
    ///
    /// Every entry of `options` is sent as `setoption` between `uciok` and
    /// the final `isready`.
    ///
    /// # Errors
    ///
    /// - `SessionError::Spawn` if the process cannot be started
    /// - `SessionError::InitFailed` if the handshake does not complete
    pub fn spawn<S: AsRef<OsStr>>(
        program: S,
        args: &[String],
        options: &BTreeMap<String, String>,
    ) -> Result<Self, SessionError> {
        let mut process = Command::new(program)
            .args(args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .spawn()
            .map_err(SessionError::Spawn)?;

        let stdin = process.stdin.take().ok_or(SessionError::InitFailed)?;
        let stdout = process.stdout.take().ok_or(SessionError::InitFailed)?;

        let mut session = Self {
            process,
            transport: UciTransport::new(BufReader::new(stdout), stdin),
            name: String::new(),
            position: None,
            depth: INITIAL_DEPTH,
            last_search: None,
            pending: None,
        };
        session.handshake(options)?;
        Ok(session)
    }

    fn handshake(&mut self, options: &BTreeMap<String, String>) -> Result<(), SessionError> {
        self.transport.send(&GuiCommand::Uci)?;

        let mut name = None;
        self.read_bounded(|msg| match msg {
            EngineMessage::Id { name: Some(n), .. } => {
                name = Some(n);
                false
            }
            EngineMessage::UciOk => true,
            _ => false,
        })?;
        self.name = name.unwrap_or_else(|| "Unknown Engine".to_string());

        for (option, value) in options {
            tracing::debug!(option = %option, value = %value, "Setting engine option");
            self.transport.send(&GuiCommand::SetOption {
                name: option.clone(),
                value: Some(value.clone()),
            })?;
        }

        self.transport.send(&GuiCommand::IsReady)?;
        self.read_bounded(|msg| msg == EngineMessage::ReadyOk)
    }

    /// Read messages until `done` accepts one, giving up after [`MAX_UCI_LINES`].
    fn read_bounded<F>(&mut self, mut done: F) -> Result<(), SessionError>
    where
        F: FnMut(EngineMessage) -> bool,
    {
        for _ in 0..MAX_UCI_LINES {
            let msg = self.transport.read_message().map_err(|e| match e {
                UciError::EngineClosed => SessionError::InitFailed,
                other => SessionError::Uci(other),
            })?;
            if done(msg) {
                return Ok(());
            }
        }
        Err(SessionError::InitFailed)
    }

    /// Bring the engine back in step after a reply that was cut short.
    ///
    /// Reads the rest of the interrupted reply, then waits for `readyok`, so
    /// the answer to the next command is the first thing on the pipe.
    fn resync(&mut self) -> Result<(), SessionError> {
        let Some(pending) = self.pending else {
            return Ok(());
        };
        tracing::warn!(?pending, "Discarding unread engine output");

        if pending == Pending::Search {
            self.transport.send(&GuiCommand::Stop)?;
        }
        self.skip_until(|msg| match pending {
            Pending::Search => matches!(msg, EngineMessage::BestMove { .. }),
            Pending::Perft => matches!(msg, EngineMessage::PerftTotal(_)),
        })?;

        self.transport.send(&GuiCommand::IsReady)?;
        self.skip_until(|msg| *msg == EngineMessage::ReadyOk)?;

        self.pending = None;
        Ok(())
    }

    /// Discard engine output up to and including the first message `done` accepts.
    fn skip_until<F>(&mut self, done: F) -> Result<(), SessionError>
    where
        F: Fn(&EngineMessage) -> bool,
    {
        loop {
            match self.transport.read_message() {
                Ok(msg) if done(&msg) => return Ok(()),
                Ok(_) | Err(UciError::LineTooLong) => {}
                Err(e) => return Err(e.into()),
            }
        }
    }

    fn current_position(&self) -> Result<&CurrentPosition, SessionError> {
        self.position.as_ref().ok_or(SessionError::NoPosition)
    }

    /// Run `go depth` for the current position, or reuse the cached result.
    ///
    /// Searches are not bounded by a line count: deep searches are chatty,
    /// and there is no timeout contract.
    fn search(&mut self) -> Result<SearchOutcome, SessionError> {
        if let Some(outcome) = &self.last_search {
            return Ok(outcome.clone());
        }
        let side_to_move = self.current_position()?.side_to_move;
        self.resync()?;

        self.transport
            .send(&GuiCommand::Go(GoOptions::depth(self.depth)))?;
        self.pending = Some(Pending::Search);

        // Only the first MultiPV line scores the move that `bestmove` names
        let mut evaluation = None;
        let best_move = loop {
            match self.transport.read_message()? {
                EngineMessage::Info(info) if info.is_primary_line() => {
                    if let Some(score) = info.exact_score() {
                        evaluation = Some(Evaluation::from_engine_score(score, side_to_move));
                    }
                }
                EngineMessage::BestMove { mv, .. } => break mv,
                _ => {}
            }
        };
        self.pending = None;

        let outcome = SearchOutcome {
            best_move,
            evaluation,
        };
        self.last_search = Some(outcome.clone());
        Ok(outcome)
    }
}

impl EngineSession for UciSession {
    fn name(&self) -> &str {
        &self.name
    }

    fn set_position(&mut self, fen: &str) -> Result<(), SessionError> {
        let side_to_move = validate_fen(fen)?;
        self.resync()?;
        self.transport.send(&GuiCommand::position_fen(fen))?;
        self.position = Some(CurrentPosition {
            fen: fen.trim().to_string(),
            side_to_move,
        });
        self.last_search = None;
        Ok(())
    }

    fn set_search_depth(&mut self, depth: u32) {
        if depth != self.depth {
            self.depth = depth;
            self.last_search = None;
        }
    }

    fn best_move(&mut self) -> Result<Option<String>, SessionError> {
        Ok(self.search()?.best_move)
    }

    fn evaluate(&mut self) -> Result<Evaluation, SessionError> {
        self.search()?.evaluation.ok_or(SessionError::NoEvaluation)
    }

    fn legal_moves(&mut self) -> Result<Vec<String>, SessionError> {
        let fen = &self.current_position()?.fen;
        tracing::trace!(fen = %fen, "Enumerating legal moves");
        self.resync()?;

        self.transport.send(&GuiCommand::Go(GoOptions::perft(1)))?;
        self.pending = Some(Pending::Perft);

        let mut moves = Vec::new();
        loop {
            match self.transport.read_message()? {
                EngineMessage::PerftMove { mv, .. } => moves.push(mv),
                EngineMessage::PerftTotal(_) => break,
                _ => {}
            }
        }
        self.pending = None;
        Ok(moves)
    }
}

impl Drop for UciSession {
    fn drop(&mut self) {
        // Ask politely, then make sure the process is gone
        let _ = self.transport.send(&GuiCommand::Quit);
        let _ = self.process.kill();
        let _ = self.process.wait();
    }
}
