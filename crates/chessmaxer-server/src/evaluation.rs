//! Position evaluation as reported to clients.

use cozy_chess::Color;
use serde::Serialize;
use uci::Score;

/// Represents a chess position evaluation from White's point of view.
///
/// Serializes as `{"type": "cp", "value": 35}` or `{"type": "mate", "value": -2}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "type", content = "value", rename_all = "lowercase")]
pub enum Evaluation {
    /// Centipawn evaluation (positive = white advantage)
    Cp(i32),
    /// Mate in N moves (positive = white mates, negative = black mates)
    Mate(i32),
}

impl Evaluation {
    /// Convert an engine score, which is relative to the side to move.
    pub fn from_engine_score(score: Score, side_to_move: Color) -> Self {
        let sign = match side_to_move {
            Color::White => 1,
            Color::Black => -1,
        };
        match score {
            Score::Cp(cp) => Evaluation::Cp(cp.saturating_mul(sign)),
            Score::Mate(m) => Evaluation::Mate(m.saturating_mul(sign)),
        }
    }
}
