//! UCI command formatting (GUI to engine).

/// Commands sent from GUI to engine.
#[derive(Debug, Clone, PartialEq)]
pub enum GuiCommand {
    /// Initialize UCI mode.
    Uci,
    /// Check if engine is ready.
    IsReady,
    /// Set an engine option.
    SetOption { name: String, value: Option<String> },
    /// Set up a position from FEN.
    Position { fen: String },
    /// Start calculating.
    Go(GoOptions),
    /// Stop calculating; the engine still answers with `bestmove`.
    Stop,
    /// Quit the engine.
    Quit,
}

/// Options for the `go` command.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct GoOptions {
    /// Search to this depth.
    pub depth: Option<u32>,
    /// Count leaf nodes to this depth instead of searching.
    ///
    /// Not part of the UCI standard, but understood by Stockfish and most
    /// of its derivatives. `perft 1` lists every legal move.
    pub perft: Option<u32>,
}

impl GoOptions {
    /// A fixed-depth search.
    pub fn depth(depth: u32) -> Self {
        Self {
            depth: Some(depth),
            ..Self::default()
        }
    }

    /// A perft run to the given depth.
    pub fn perft(depth: u32) -> Self {
        Self {
            perft: Some(depth),
            ..Self::default()
        }
    }
}

impl GuiCommand {
    /// Set up a position from a FEN string.
    pub fn position_fen(fen: &str) -> Self {
        GuiCommand::Position {
            fen: fen.trim().to_string(),
        }
    }

    /// Format command for output.
    pub fn to_uci(&self) -> String {
        match self {
            GuiCommand::Uci => "uci".to_string(),
            GuiCommand::IsReady => "isready".to_string(),
            GuiCommand::SetOption { name, value } => match value {
                Some(v) => format!("setoption name {} value {}", name, v),
                None => format!("setoption name {}", name),
            },
            GuiCommand::Position { fen } => format!("position fen {}", fen),
            GuiCommand::Go(opts) => {
                // perft and depth are mutually exclusive; perft wins
                if let Some(p) = opts.perft {
                    format!("go perft {}", p)
                } else if let Some(d) = opts.depth {
                    format!("go depth {}", d)
                } else {
                    "go".to_string()
                }
            }
            GuiCommand::Stop => "stop".to_string(),
            GuiCommand::Quit => "quit".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_simple_commands() {
        assert_eq!(GuiCommand::Uci.to_uci(), "uci");
        assert_eq!(GuiCommand::IsReady.to_uci(), "isready");
        assert_eq!(GuiCommand::Stop.to_uci(), "stop");
        assert_eq!(GuiCommand::Quit.to_uci(), "quit");
    }

    #[test]
    fn format_position_fen_trims_input() {
        let cmd = GuiCommand::position_fen(
            "  rnbqkbnr/pppppppp/8/8/4P3/8/PPPP1PPP/RNBQKBNR b KQkq e3 0 1\n",
        );
        assert_eq!(
            cmd.to_uci(),
            "position fen rnbqkbnr/pppppppp/8/8/4P3/8/PPPP1PPP/RNBQKBNR b KQkq e3 0 1"
        );
    }

    #[test]
    fn format_go_depth() {
        assert_eq!(GuiCommand::Go(GoOptions::depth(15)).to_uci(), "go depth 15");
    }

    #[test]
    fn format_go_perft() {
        assert_eq!(GuiCommand::Go(GoOptions::perft(1)).to_uci(), "go perft 1");
    }

    #[test]
    fn format_setoption() {
        let cmd = GuiCommand::SetOption {
            name: "Threads".to_string(),
            value: Some("4".to_string()),
        };
        assert_eq!(cmd.to_uci(), "setoption name Threads value 4");

        let button = GuiCommand::SetOption {
            name: "Clear Hash".to_string(),
            value: None,
        };
        assert_eq!(button.to_uci(), "setoption name Clear Hash");
    }
}
