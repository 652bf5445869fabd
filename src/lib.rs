// Terminal chess board driven by a UCI engine (Stockfish by default)
pub mod board;
pub mod config;
pub mod engine;
pub mod error;
pub mod session;
pub mod uci;

pub use config::{SessionConfig, Side};
pub use error::{Error, Result};
pub use session::{AnalysisDisplay, Session};
