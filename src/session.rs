//! A play session: the current position, the engine that analyzes it, and the
//! two displays (best move and evaluation) the UI shows.

use crate::board::{MoveOutcome, Position, Status};
use crate::config::SessionConfig;
use crate::engine::{EngineBridge, Reply, RequestId, StockfishProcess, Transport};
use crate::error::Result;
use crate::uci;
use cozy_chess::{Piece, Square};
use log::{debug, info, warn};
use std::fmt;
use std::time::{Duration, Instant};

pub const BEST_MOVE_PLACEHOLDER: &str = "Calculating...";
pub const EVALUATION_PLACEHOLDER: &str = "Evaluating...";

/// Latest best move and evaluation; each is overwritten independently as
/// engine lines come in.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AnalysisDisplay {
    pub best_move: Option<String>,
    pub evaluation: Option<String>,
}

impl AnalysisDisplay {
    pub fn best_move_text(&self) -> &str { self.best_move.as_deref().unwrap_or(BEST_MOVE_PLACEHOLDER) }

    pub fn evaluation_text(&self) -> &str { self.evaluation.as_deref().unwrap_or(EVALUATION_PLACEHOLDER) }
}

impl fmt::Display for AnalysisDisplay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Best Move: {}", self.best_move_text())?;
        write!(f, "Evaluation: {}", self.evaluation_text())
    }
}

pub struct Session<T: Transport> {
    bridge: EngineBridge<T>,
    position: Position,
    display: AnalysisDisplay,
    latest: Option<RequestId>,
    config: SessionConfig,
}

impl Session<StockfishProcess> {
    /// Spawns the configured engine and completes the UCI handshake.
    pub fn launch(config: SessionConfig) -> Result<Self> {
        let process = StockfishProcess::spawn(&config.engine_path)?;
        let timeout = config.handshake_timeout();
        let mut session = Session::new(process, config)?;
        session.bridge.handshake(timeout)?;
        Ok(session)
    }
}

impl<T: Transport> Session<T> {
    pub fn new(transport: T, config: SessionConfig) -> Result<Self> {
        let position = config.start_position()?;
        Ok(Self {
            bridge: EngineBridge::new(transport),
            position,
            display: AnalysisDisplay::default(),
            latest: None,
            config,
        })
    }

    pub fn position(&self) -> &Position { &self.position }

    pub fn display(&self) -> &AnalysisDisplay { &self.display }

    pub fn latest_request(&self) -> Option<RequestId> { self.latest }

    pub fn status(&self) -> Status { self.position.status() }

    /// True while the newest analysis request has not produced its `bestmove`.
    pub fn is_searching(&self) -> bool { self.latest.is_some_and(|id| self.bridge.is_pending(id)) }

    /// A piece was dropped from `from` onto `to`. Promotions always take a
    /// queen. An accepted move replaces the position and asks the engine to
    /// analyze it; a rejected one changes nothing and sends nothing.
    pub fn on_drop(&mut self, from: Square, to: Square) -> Result<MoveOutcome> {
        let outcome = self.position.try_move(from, to, Piece::Queen);
        match &outcome {
            MoveOutcome::Applied(next) => {
                debug!("accepted {}{}", from, to);
                self.position = next.clone();
                self.analyze()?;
            }
            MoveOutcome::Rejected => debug!("rejected {}{}", from, to),
        }
        Ok(outcome)
    }

    /// Requests analysis of the current position.
    pub fn analyze(&mut self) -> Result<RequestId> {
        if self.config.cancel_superseded && self.bridge.in_flight() > 0 {
            self.bridge.stop()?;
        }
        let mover = !self.position.side_to_move();
        let id = self.bridge.request_analysis(&self.position.fen(), self.config.depth, mover)?;
        self.latest = Some(id);
        Ok(id)
    }

    /// Back to the configured start position with empty displays. If the
    /// engine plays the side to move, its first search starts right away.
    pub fn new_game(&mut self) -> Result<()> {
        self.position = self.config.start_position()?;
        self.display = AnalysisDisplay::default();
        self.latest = None;
        self.bridge.new_game()?;
        if self.engine_to_move() {
            self.analyze()?;
        }
        Ok(())
    }

    fn engine_to_move(&self) -> bool {
        self.config.engine_color() == Some(self.position.side_to_move())
            && self.position.status() == Status::Ongoing
    }

    /// Applies one engine line. Returns whether the displays changed; lines
    /// for superseded requests are dropped.
    pub fn handle_reply(&mut self, reply: Reply) -> Result<bool> {
        let Some(request) = reply.request else { return Ok(false) };
        if Some(request.id) != self.latest {
            debug!("dropping reply for stale request {}: {}", request.id, reply.line);
            return Ok(false);
        }
        let report = uci::parse_line(&reply.line, request.turn);
        if report.is_empty() { return Ok(false); }
        if let Some(evaluation) = report.evaluation {
            self.display.evaluation = Some(evaluation);
        }
        if let Some(best) = report.best_move {
            self.display.best_move = Some(best.clone());
            if self.engine_to_move() {
                self.play_engine_move(&best)?;
            }
        }
        Ok(true)
    }

    fn play_engine_move(&mut self, best: &str) -> Result<()> {
        match self.position.try_move_uci(best) {
            Ok(MoveOutcome::Applied(next)) => {
                info!("engine plays {}", best);
                self.position = next;
                self.analyze()?;
            }
            Ok(MoveOutcome::Rejected) => warn!("engine suggested illegal move {}", best),
            Err(e) => warn!("cannot play engine move `{}`: {}", best, e),
        }
        Ok(())
    }

    /// Handles every engine line already available without blocking.
    pub fn pump(&mut self) -> Result<usize> {
        let mut handled = 0usize;
        while let Some(reply) = self.bridge.next_reply(Duration::ZERO)? {
            self.handle_reply(reply)?;
            handled += 1;
        }
        Ok(handled)
    }

    /// Handles engine lines until the newest request finishes. When the
    /// engine answers with a move of its own this keeps waiting for the
    /// analysis that follows. Returns `false` on timeout.
    pub fn wait_for_search(&mut self, timeout: Duration) -> Result<bool> {
        let deadline = Instant::now() + timeout;
        while self.is_searching() {
            let remaining = deadline.saturating_duration_since(Instant::now());
            match self.bridge.next_reply(remaining)? {
                Some(reply) => { self.handle_reply(reply)?; }
                None => return Ok(false),
            }
        }
        Ok(true)
    }

    /// Ends the session and stops the engine. Consuming `self` means no
    /// further engine lines can be handled.
    pub fn shutdown(self) -> Result<()> {
        info!("shutting down session");
        self.bridge.terminate()?;
        Ok(())
    }
}
