//! UCI info line parsing.

use serde::{Deserialize, Serialize};

/// Score in centipawns or mate distance, relative to the side to move.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Score {
    /// Centipawn score (100 = 1 pawn advantage).
    Cp(i32),
    /// Mate in N moves (positive = side to move mates, negative = gets mated).
    Mate(i32),
}

/// Marks a score as a search bound rather than an exact value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Bound {
    Lower,
    Upper,
}

/// Search information from engine.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct EngineInfo {
    /// Search depth in plies.
    pub depth: Option<u32>,
    /// Selective search depth.
    pub seldepth: Option<u32>,
    /// Index of the line when the engine reports several.
    pub multipv: Option<u32>,
    /// Score evaluation.
    pub score: Option<Score>,
    /// Set when the score is only a lower or upper bound.
    pub bound: Option<Bound>,
    /// Nodes searched.
    pub nodes: Option<u64>,
    /// Nodes per second.
    pub nps: Option<u64>,
    /// Time spent in milliseconds.
    pub time: Option<u64>,
    /// Principal variation (best line found).
    pub pv: Vec<String>,
    /// Current move being searched.
    pub currmove: Option<String>,
    /// Hash table usage (per mille).
    pub hashfull: Option<u32>,
    /// Arbitrary string info.
    pub string: Option<String>,
}

impl EngineInfo {
    /// Create a new empty info.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the score if it is exact, i.e. not a fail-high or fail-low bound.
    pub fn exact_score(&self) -> Option<Score> {
        match self.bound {
            Some(_) => None,
            None => self.score,
        }
    }

    /// True for the best line, or when the engine reports only one.
    pub fn is_primary_line(&self) -> bool {
        matches!(self.multipv, None | Some(1))
    }

    /// Parse a UCI `info` line. Returns `None` for any other line.
    ///
    /// Unknown keywords are skipped. `pv` runs until the next keyword and
    /// `string` takes the rest of the line.
    pub fn parse(line: &str) -> Option<Self> {
        let mut tokens = line.split_whitespace().peekable();
        if tokens.next() != Some("info") {
            return None;
        }

        let mut info = EngineInfo::new();
        while let Some(keyword) = tokens.next() {
            match keyword {
                "depth" => info.depth = value(&mut tokens),
                "seldepth" => info.seldepth = value(&mut tokens),
                "multipv" => info.multipv = value(&mut tokens),
                "nodes" => info.nodes = value(&mut tokens),
                "nps" => info.nps = value(&mut tokens),
                "time" => info.time = value(&mut tokens),
                "hashfull" => info.hashfull = value(&mut tokens),
                "currmove" => info.currmove = tokens.next().map(str::to_string),
                "score" => {
                    let kind = tokens.next();
                    let amount = value(&mut tokens);
                    info.score = match (kind, amount) {
                        (Some("cp"), Some(cp)) => Some(Score::Cp(cp)),
                        (Some("mate"), Some(n)) => Some(Score::Mate(n)),
                        _ => None,
                    };
                }
                "lowerbound" => info.bound = Some(Bound::Lower),
                "upperbound" => info.bound = Some(Bound::Upper),
                "pv" => {
                    while let Some(mv) = tokens.next_if(|t| !is_info_keyword(t)) {
                        info.pv.push(mv.to_string());
                    }
                }
                "string" => {
                    info.string = Some(tokens.by_ref().collect::<Vec<_>>().join(" "));
                }
                _ => {}
            }
        }

        Some(info)
    }
}

fn value<'a, T, I>(tokens: &mut I) -> Option<T>
where
    T: std::str::FromStr,
    I: Iterator<Item = &'a str>,
{
    tokens.next().and_then(|t| t.parse().ok())
}

fn is_info_keyword(s: &str) -> bool {
    matches!(
        s,
        "depth"
            | "seldepth"
            | "multipv"
            | "score"
            | "nodes"
            | "nps"
            | "time"
            | "pv"
            | "currmove"
            | "currmovenumber"
            | "hashfull"
            | "tbhits"
            | "wdl"
            | "string"
    )
}
