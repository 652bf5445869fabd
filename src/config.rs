use crate::board::{Position, PositionError};
use crate::error::{Error, Result};
use crate::uci::DEFAULT_DEPTH;
use cozy_chess::Color;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    White,
    Black,
}

impl From<Side> for Color {
    fn from(side: Side) -> Self {
        match side {
            Side::White => Color::White,
            Side::Black => Color::Black,
        }
    }
}

/// Session settings. Every field has a default, so a config file only needs
/// the keys it changes.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Engine executable, looked up on PATH when not absolute.
    pub engine_path: String,
    pub depth: u32,
    /// Starting FEN; standard start position when unset.
    pub start_fen: Option<String>,
    /// Send `stop` before starting a search while another is still running.
    pub cancel_superseded: bool,
    pub handshake_timeout_ms: u64,
    /// Side the engine moves for; unset means the engine only advises.
    pub engine_plays: Option<Side>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            engine_path: "stockfish".to_string(),
            depth: DEFAULT_DEPTH,
            start_fen: None,
            cancel_superseded: false,
            handshake_timeout_ms: 5000,
            engine_plays: None,
        }
    }
}

impl SessionConfig {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .map_err(|source| Error::ConfigRead { path: path.to_path_buf(), source })?;
        serde_json::from_str(&text).map_err(|source| Error::ConfigParse { path: path.to_path_buf(), source })
    }

    pub fn start_position(&self) -> std::result::Result<Position, PositionError> {
        match &self.start_fen {
            Some(fen) => Position::from_fen(fen),
            None => Ok(Position::startpos()),
        }
    }

    pub fn handshake_timeout(&self) -> Duration { Duration::from_millis(self.handshake_timeout_ms) }

    pub fn engine_color(&self) -> Option<Color> { self.engine_plays.map(Color::from) }
}
