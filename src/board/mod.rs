pub mod cozy;

pub use cozy::{parse_drag, parse_square, parse_uci_move, MoveOutcome, Position, PositionError, Status};
