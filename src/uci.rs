//! UCI text protocol, client side: commands we send to the engine and the
//! parser for the lines it sends back.

use cozy_chess::Color;
use std::fmt;

/// Search depth used for every analysis request unless configured otherwise.
pub const DEFAULT_DEPTH: u32 = 15;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum UciCommand {
    Uci,
    IsReady,
    UciNewGame,
    Position { fen: String },
    Go { depth: u32 },
    Stop,
    Quit,
}

impl fmt::Display for UciCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UciCommand::Uci => write!(f, "uci"),
            UciCommand::IsReady => write!(f, "isready"),
            UciCommand::UciNewGame => write!(f, "ucinewgame"),
            UciCommand::Position { fen } => write!(f, "position fen {}", fen),
            UciCommand::Go { depth } => write!(f, "go depth {}", depth),
            UciCommand::Stop => write!(f, "stop"),
            UciCommand::Quit => write!(f, "quit"),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Score {
    Centipawns(i64),
    /// Moves to mate; negative when the side to move is getting mated.
    Mate(i64),
}

impl Score {
    /// Display string from White's point of view. `turn` is the side whose
    /// move produced the analyzed position; the engine scores for the other
    /// side, so centipawns flip sign unless `turn` is Black.
    pub fn display(self, turn: Color) -> String {
        match self {
            Score::Centipawns(cp) => {
                let cp = if turn != Color::Black { cp.saturating_neg() } else { cp };
                format!("{}", cp as f64 / 100.0)
            }
            Score::Mate(n) => format!("Mate in {}", n.unsigned_abs()),
        }
    }
}

/// What one engine line contributes to the displays. Both fields empty means
/// the line was not one we understand.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct EngineReport {
    pub best_move: Option<String>,
    pub evaluation: Option<String>,
}

impl EngineReport {
    pub fn is_empty(&self) -> bool { self.best_move.is_none() && self.evaluation.is_none() }
}

pub fn is_bestmove(line: &str) -> bool { line.trim_start().starts_with("bestmove") }

/// `bestmove <move> [ponder <move>]` -> `<move>`.
pub fn parse_bestmove(line: &str) -> Option<&str> {
    if !is_bestmove(line) { return None; }
    line.split_whitespace().nth(1)
}

/// `info ... score cp|mate <n> ...` -> score. Anything else, including a
/// non-numeric value, is `None`.
pub fn parse_score(line: &str) -> Option<Score> {
    if !line.contains("info") { return None; }
    let mut tokens = line.split_whitespace().skip_while(|t| *t != "score");
    tokens.next()?;
    let kind = tokens.next()?;
    let value = tokens.next()?.parse::<i64>().ok()?;
    match kind {
        "cp" => Some(Score::Centipawns(value)),
        "mate" => Some(Score::Mate(value)),
        _ => None,
    }
}

pub fn parse_line(line: &str, turn: Color) -> EngineReport {
    EngineReport {
        best_move: parse_bestmove(line).map(str::to_string),
        evaluation: parse_score(line).map(|s| s.display(turn)),
    }
}
