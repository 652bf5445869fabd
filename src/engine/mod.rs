//! Engine bridge: one engine per session, spoken to over a line transport.
//!
//! UCI has no way to echo a request id back, so correlation is done here.
//! An engine answers commands in order and emits exactly one `bestmove` per
//! `go`, so outstanding searches are kept in a FIFO: every inbound line is
//! attributed to the oldest outstanding search, which is retired by its
//! `bestmove`.

pub mod process;

pub use process::StockfishProcess;

use crate::uci::{self, UciCommand};
use cozy_chess::Color;
use log::{debug, trace, warn};
use std::collections::VecDeque;
use std::fmt;
use std::io;
use std::time::{Duration, Instant};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("failed to start engine `{path}`: {source}")]
    Spawn {
        path: String,
        #[source]
        source: io::Error,
    },
    #[error("engine i/o error: {0}")]
    Io(#[from] io::Error),
    #[error("engine closed its output")]
    Disconnected,
    #[error("engine did not answer `{expected}` within {timeout_ms} ms")]
    Timeout { expected: &'static str, timeout_ms: u64 },
    #[error("engine has been terminated")]
    Terminated,
}

/// Line-oriented connection to an engine.
pub trait Transport {
    fn send_line(&mut self, line: &str) -> Result<(), EngineError>;

    /// Next line from the engine, waiting at most `wait` (`Duration::ZERO`
    /// polls). `Ok(None)` means nothing arrived in time.
    fn recv_line(&mut self, wait: Duration) -> Result<Option<String>, EngineError>;

    /// Stops the engine. Further sends and receives fail with `Terminated`.
    fn terminate(&mut self) -> Result<(), EngineError>;
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RequestId(u64);

impl RequestId {
    pub fn value(self) -> u64 { self.0 }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { write!(f, "#{}", self.0) }
}

/// An analysis request that has not seen its `bestmove` yet.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Pending {
    pub id: RequestId,
    /// Side whose move produced the analyzed position.
    pub turn: Color,
}

/// One engine line, tagged with the request it answers. Lines that arrive
/// while no search is outstanding (handshake chatter) carry no request.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Reply {
    pub request: Option<Pending>,
    pub line: String,
}

impl Reply {
    pub fn is_bestmove(&self) -> bool { uci::is_bestmove(&self.line) }
}

pub struct EngineBridge<T: Transport> {
    transport: T,
    next_id: u64,
    pending: VecDeque<Pending>,
}

impl<T: Transport> EngineBridge<T> {
    pub fn new(transport: T) -> Self {
        Self { transport, next_id: 1, pending: VecDeque::new() }
    }

    pub fn send(&mut self, cmd: &UciCommand) -> Result<(), EngineError> {
        let line = cmd.to_string();
        debug!("> {}", line);
        self.transport.send_line(&line)
    }

    /// `uci`/`uciok` then `isready`/`readyok`.
    pub fn handshake(&mut self, timeout: Duration) -> Result<(), EngineError> {
        self.send(&UciCommand::Uci)?;
        self.await_line("uciok", timeout)?;
        self.send(&UciCommand::IsReady)?;
        self.await_line("readyok", timeout)
    }

    fn await_line(&mut self, expected: &'static str, timeout: Duration) -> Result<(), EngineError> {
        let deadline = Instant::now() + timeout;
        loop {
            let remaining = deadline.saturating_duration_since(Instant::now());
            match self.transport.recv_line(remaining)? {
                Some(line) if line.trim() == expected => return Ok(()),
                Some(line) => trace!("< {}", line),
                None => {
                    return Err(EngineError::Timeout { expected, timeout_ms: timeout.as_millis() as u64 })
                }
            }
        }
    }

    /// Sends `position fen <fen>` then `go depth <depth>` and returns the id
    /// that replies to this search will carry.
    pub fn request_analysis(&mut self, fen: &str, depth: u32, turn: Color) -> Result<RequestId, EngineError> {
        self.send(&UciCommand::Position { fen: fen.to_string() })?;
        self.send(&UciCommand::Go { depth })?;
        let id = RequestId(self.next_id);
        self.next_id += 1;
        self.pending.push_back(Pending { id, turn });
        Ok(id)
    }

    pub fn stop(&mut self) -> Result<(), EngineError> { self.send(&UciCommand::Stop) }

    pub fn new_game(&mut self) -> Result<(), EngineError> { self.send(&UciCommand::UciNewGame) }

    pub fn in_flight(&self) -> usize { self.pending.len() }

    pub fn is_pending(&self, id: RequestId) -> bool { self.pending.iter().any(|p| p.id == id) }

    pub fn next_reply(&mut self, wait: Duration) -> Result<Option<Reply>, EngineError> {
        let Some(line) = self.transport.recv_line(wait)? else { return Ok(None) };
        trace!("< {}", line);
        let request = self.pending.front().copied();
        if uci::is_bestmove(&line) && self.pending.pop_front().is_none() {
            warn!("engine sent `{}` with no search outstanding", line.trim());
        }
        Ok(Some(Reply { request, line }))
    }

    pub fn terminate(mut self) -> Result<(), EngineError> {
        if !self.pending.is_empty() {
            debug!("terminating engine with {} search(es) outstanding", self.pending.len());
        }
        self.pending.clear();
        self.transport.terminate()
    }
}
