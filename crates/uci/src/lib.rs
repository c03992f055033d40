//! UCI (Universal Chess Interface) protocol library, client side.
//!
//! This crate formats the commands a GUI sends to a chess engine and parses
//! what the engine sends back. [`UciTransport`] ties both directions to a
//! line-oriented reader/writer pair, typically the stdout/stdin pipes of an
//! engine subprocess.
//!
//! # Commands sent
//!
//! - `uci` / `isready` - Handshake and synchronization
//! - `setoption name <name> [value <value>]` - Engine options
//! - `position fen <fen>` - Set position
//! - `go depth <d>` / `go perft <d>` - Search or enumerate moves
//! - `stop` / `quit` - Stop a search, exit engine
//!
//! # Messages parsed
//!
//! - `id name <name>` / `id author <author>`
//! - `uciok` / `readyok`
//! - `info ...` - Search information
//! - `bestmove <move> [ponder <move>]` (`(none)` when there is no legal move)
//! - `<move>: <nodes>` and `Nodes searched: <n>` - Perft output

mod command;
mod info;

pub use command::{GoOptions, GuiCommand};
pub use info::{Bound, EngineInfo, Score};

use std::io::{BufRead, Read, Write};
use thiserror::Error;

/// Longest engine output line accepted, newline included.
pub const MAX_LINE_BYTES: u64 = 64 * 1024;

#[derive(Error, Debug)]
pub enum UciError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
    #[error("Engine closed its output stream")]
    EngineClosed,
    #[error("Engine output line exceeds 64 KiB")]
    LineTooLong,
}

/// Messages sent from engine to GUI.
#[derive(Debug, Clone, PartialEq)]
pub enum EngineMessage {
    /// Engine identification.
    Id {
        name: Option<String>,
        author: Option<String>,
    },
    /// UCI initialization complete.
    UciOk,
    /// Engine is ready.
    ReadyOk,
    /// Search information.
    Info(EngineInfo),
    /// Best move found, `None` when the position has no legal move.
    BestMove {
        mv: Option<String>,
        ponder: Option<String>,
    },
    /// One root move of a perft run with its node count.
    PerftMove { mv: String, nodes: u64 },
    /// Final line of a perft run.
    PerftTotal(u64),
    /// Anything else (option declarations, banners, blank lines).
    Unknown(String),
}

impl EngineMessage {
    /// Parse a line of engine output.
    pub fn parse(line: &str) -> Self {
        let line = line.trim();
        let mut parts = line.split_whitespace();

        match parts.next().unwrap_or("") {
            "uciok" => EngineMessage::UciOk,
            "readyok" => EngineMessage::ReadyOk,
            "id" => match parts.next() {
                Some("name") => EngineMessage::Id {
                    name: Some(rest_after(line, 2)),
                    author: None,
                },
                Some("author") => EngineMessage::Id {
                    name: None,
                    author: Some(rest_after(line, 2)),
                },
                _ => EngineMessage::Unknown(line.to_string()),
            },
            "info" => match EngineInfo::parse(line) {
                Some(info) => EngineMessage::Info(info),
                None => EngineMessage::Unknown(line.to_string()),
            },
            "bestmove" => {
                let mv = parts.next().filter(|m| is_coordinate_move(m));
                let ponder = match parts.next() {
                    Some("ponder") => parts.next().map(str::to_string),
                    _ => None,
                };
                EngineMessage::BestMove {
                    mv: mv.map(str::to_string),
                    ponder,
                }
            }
            _ => Self::parse_perft(line).unwrap_or_else(|| EngineMessage::Unknown(line.to_string())),
        }
    }

    fn parse_perft(line: &str) -> Option<Self> {
        if let Some(total) = line.strip_prefix("Nodes searched:") {
            return total.trim().parse().ok().map(EngineMessage::PerftTotal);
        }
        let (mv, nodes) = line.split_once(':')?;
        if !is_coordinate_move(mv) {
            return None;
        }
        let nodes = nodes.trim().parse().ok()?;
        Some(EngineMessage::PerftMove {
            mv: mv.to_string(),
            nodes,
        })
    }
}

/// Returns everything after the first `n` whitespace-separated tokens.
fn rest_after(line: &str, n: usize) -> String {
    let mut rest = line;
    for _ in 0..n {
        rest = rest.trim_start();
        rest = rest.find(char::is_whitespace).map_or("", |idx| &rest[idx..]);
    }
    rest.trim().to_string()
}

/// Checks for coordinate notation: `e2e4`, or `e7e8q` with a promotion piece.
///
/// Rejects the null move markers `0000` and `(none)`.
pub fn is_coordinate_move(s: &str) -> bool {
    let b = s.as_bytes();
    let square = |f: u8, r: u8| (b'a'..=b'h').contains(&f) && (b'1'..=b'8').contains(&r);
    match b.len() {
        4 => square(b[0], b[1]) && square(b[2], b[3]),
        5 => square(b[0], b[1]) && square(b[2], b[3]) && matches!(b[4], b'q' | b'r' | b'b' | b'n'),
        _ => false,
    }
}

/// Line transport between a GUI and an engine.
pub struct UciTransport<R: BufRead, W: Write> {
    reader: R,
    writer: W,
}

impl<R: BufRead, W: Write> UciTransport<R, W> {
    pub fn new(reader: R, writer: W) -> Self {
        Self { reader, writer }
    }

    /// Send a command to the engine.
    pub fn send(&mut self, cmd: &GuiCommand) -> Result<(), UciError> {
        writeln!(self.writer, "{}", cmd.to_uci())?;
        self.writer.flush()?;
        Ok(())
    }

    /// Read and parse the next line from the engine.
    ///
    /// Blocks until a full line is available. Bytes that are not UTF-8 are
    /// replaced, never an error. End of stream means the engine has exited
    /// and is reported as [`UciError::EngineClosed`].
    ///
    /// A line over [`MAX_LINE_BYTES`] is discarded up to its newline and
    /// reported as [`UciError::LineTooLong`]; the next read starts on the
    /// following line.
    pub fn read_message(&mut self) -> Result<EngineMessage, UciError> {
        let mut buf = Vec::new();
        let n = (&mut self.reader)
            .take(MAX_LINE_BYTES)
            .read_until(b'\n', &mut buf)?;
        if n == 0 {
            return Err(UciError::EngineClosed);
        }
        if n as u64 == MAX_LINE_BYTES && !buf.ends_with(b"\n") {
            self.skip_line()?;
            return Err(UciError::LineTooLong);
        }
        Ok(EngineMessage::parse(&String::from_utf8_lossy(&buf)))
    }

    fn skip_line(&mut self) -> Result<(), UciError> {
        let mut scratch = Vec::new();
        loop {
            scratch.clear();
            let n = (&mut self.reader)
                .take(MAX_LINE_BYTES)
                .read_until(b'\n', &mut scratch)?;
            if n == 0 || scratch.ends_with(b"\n") {
                return Ok(());
            }
        }
    }
}
