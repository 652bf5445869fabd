use cozy_chess::{Board as CozyBoard, Color, File, GameStatus, Move, Piece, Square};
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PositionError {
    #[error("FEN error: {0}")]
    Fen(String),
    #[error("invalid square `{0}`")]
    Square(String),
    #[error("invalid move `{0}`: expected e.g. e2e4, e2 e4 or e7e8q")]
    MoveText(String),
}

/// Result of attempting a move on a position. The original position is never
/// touched; an accepted move hands back the successor.
#[derive(Clone, Debug)]
pub enum MoveOutcome {
    Applied(Position),
    Rejected,
}

impl MoveOutcome {
    pub fn is_applied(&self) -> bool { matches!(self, MoveOutcome::Applied(_)) }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Status {
    Ongoing,
    Checkmate { winner: Color },
    Drawn,
}

#[derive(Clone, Debug)]
pub struct Position {
    board: CozyBoard,
}

impl Position {
    pub fn startpos() -> Self {
        Self { board: CozyBoard::default() }
    }

    pub fn from_fen(fen: &str) -> Result<Self, PositionError> {
        CozyBoard::from_fen(fen.trim(), false)
            .map(|b| Self { board: b })
            .map_err(|e| PositionError::Fen(format!("{e:?}")))
    }

    pub fn board(&self) -> &CozyBoard { &self.board }

    pub fn fen(&self) -> String { self.board.to_string() }

    pub fn side_to_move(&self) -> Color { self.board.side_to_move() }

    /// Tries `from -> to` on a copy of this position. `promotion` only applies
    /// when the move actually promotes. Castling is accepted both as the king's
    /// two-square step (e1g1) and as king-takes-rook (e1h1).
    pub fn try_move(&self, from: Square, to: Square, promotion: Piece) -> MoveOutcome {
        let Some(mv) = self.find_legal(from, to, promotion) else {
            return MoveOutcome::Rejected;
        };
        let mut next = self.board.clone();
        match next.try_play(mv) {
            Ok(()) => MoveOutcome::Applied(Self { board: next }),
            Err(_) => MoveOutcome::Rejected,
        }
    }

    /// Applies a move in UCI notation, e.g. an engine's `bestmove` token.
    /// A missing promotion suffix defaults to queen.
    pub fn try_move_uci(&self, mv_uci: &str) -> Result<MoveOutcome, PositionError> {
        let (from, to, promo) = parse_uci_move(mv_uci)?;
        Ok(self.try_move(from, to, promo.unwrap_or(Piece::Queen)))
    }

    fn find_legal(&self, from: Square, to: Square, promotion: Piece) -> Option<Move> {
        let mut found = None;
        self.board.generate_moves(|moves| {
            if moves.from != from { return false; }
            for m in moves {
                let dest_matches = m.to == to || self.castle_destination(m) == Some(to);
                let promo_matches = m.promotion.map_or(true, |p| p == promotion);
                if dest_matches && promo_matches {
                    found = Some(m);
                    break;
                }
            }
            found.is_some()
        });
        found
    }

    // King-takes-own-rook is how cozy-chess encodes castling.
    fn castle_destination(&self, m: Move) -> Option<Square> {
        let stm = self.board.side_to_move();
        if self.board.piece_on(m.from) != Some(Piece::King) || self.board.color_on(m.to) != Some(stm) {
            return None;
        }
        let file = if m.to.file() > m.from.file() { File::G } else { File::C };
        Some(Square::new(file, m.from.rank()))
    }

    pub fn legal_moves_count(&self) -> usize {
        let mut ct = 0usize;
        self.board.generate_moves(|moves| { ct += moves.len(); false });
        ct
    }

    pub fn status(&self) -> Status {
        match self.board.status() {
            GameStatus::Ongoing => Status::Ongoing,
            GameStatus::Drawn => Status::Drawn,
            GameStatus::Won => Status::Checkmate { winner: !self.board.side_to_move() },
        }
    }

    pub fn set_from_start_and_moves(moves: &[String]) -> Result<Self, PositionError> {
        let mut pos = Self::startpos();
        for m in moves {
            pos = match pos.try_move_uci(m)? {
                MoveOutcome::Applied(next) => next,
                MoveOutcome::Rejected => return Err(PositionError::MoveText(m.clone())),
            };
        }
        Ok(pos)
    }

    /// Plain text board, White at the bottom, uppercase for White pieces.
    pub fn diagram(&self) -> String {
        let mut out = String::new();
        for rank in (0..8).rev() {
            out.push_str(&format!("{} ", rank + 1));
            for file in 0..8 {
                let sq = Square::index(rank * 8 + file);
                let c = match (self.board.piece_on(sq), self.board.color_on(sq)) {
                    (Some(p), Some(col)) => piece_char(p, col),
                    _ => '.',
                };
                out.push(' ');
                out.push(c);
            }
            out.push('\n');
        }
        out.push_str("   a b c d e f g h");
        out
    }
}

impl Default for Position {
    fn default() -> Self { Self::startpos() }
}

fn piece_char(piece: Piece, color: Color) -> char {
    let c = match piece {
        Piece::Pawn => 'p',
        Piece::Knight => 'n',
        Piece::Bishop => 'b',
        Piece::Rook => 'r',
        Piece::Queen => 'q',
        Piece::King => 'k',
    };
    if color == Color::White { c.to_ascii_uppercase() } else { c }
}

pub fn parse_square(s: &str) -> Result<Square, PositionError> {
    s.trim().parse::<Square>().map_err(|_| PositionError::Square(s.to_string()))
}

/// Parses `e2e4`, `e7e8q` (engine style) into squares and optional promotion.
pub fn parse_uci_move(s: &str) -> Result<(Square, Square, Option<Piece>), PositionError> {
    let s = s.trim();
    if !s.is_ascii() || !(s.len() == 4 || s.len() == 5) {
        return Err(PositionError::MoveText(s.to_string()));
    }
    let from = parse_square(&s[0..2])?;
    let to = parse_square(&s[2..4])?;
    let promo = match s.as_bytes().get(4) {
        None => None,
        Some(b'q') => Some(Piece::Queen),
        Some(b'r') => Some(Piece::Rook),
        Some(b'b') => Some(Piece::Bishop),
        Some(b'n') => Some(Piece::Knight),
        Some(_) => return Err(PositionError::MoveText(s.to_string())),
    };
    Ok((from, to, promo))
}

/// Parses user input: `e2e4` or `e2 e4`. Any promotion suffix is ignored
/// since the UI always promotes to a queen.
pub fn parse_drag(input: &str) -> Result<(Square, Square), PositionError> {
    let parts: Vec<&str> = input.split_whitespace().collect();
    match parts.as_slice() {
        [from, to] => Ok((parse_square(from)?, parse_square(to)?)),
        [mv] => parse_uci_move(mv).map(|(from, to, _)| (from, to)),
        _ => Err(PositionError::MoveText(input.trim().to_string())),
    }
}
