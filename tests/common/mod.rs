// Scripted in-memory engine shared by the integration tests.
#![allow(dead_code)]

use fishboard::engine::{EngineError, Transport};
use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;
use std::time::Duration;

#[derive(Default)]
struct State {
    sent: Vec<String>,
    inbox: VecDeque<String>,
    terminated: bool,
}

/// Answers `uci` and `isready` on its own; everything else the test queues
/// with `push`. Clones share state, so keep one as a handle for inspection.
#[derive(Clone, Default)]
pub struct FakeEngine {
    state: Rc<RefCell<State>>,
}

impl FakeEngine {
    pub fn new() -> Self { Self::default() }

    pub fn push(&self, line: &str) { self.state.borrow_mut().inbox.push_back(line.to_string()); }

    pub fn sent(&self) -> Vec<String> { self.state.borrow().sent.clone() }

    pub fn clear_sent(&self) { self.state.borrow_mut().sent.clear(); }

    pub fn terminated(&self) -> bool { self.state.borrow().terminated }

    pub fn pending_lines(&self) -> usize { self.state.borrow().inbox.len() }
}

impl Transport for FakeEngine {
    fn send_line(&mut self, line: &str) -> Result<(), EngineError> {
        let mut st = self.state.borrow_mut();
        if st.terminated { return Err(EngineError::Terminated); }
        st.sent.push(line.to_string());
        match line {
            "uci" => {
                st.inbox.push_back("id name FakeFish".to_string());
                st.inbox.push_back("uciok".to_string());
            }
            "isready" => st.inbox.push_back("readyok".to_string()),
            _ => {}
        }
        Ok(())
    }

    fn recv_line(&mut self, _wait: Duration) -> Result<Option<String>, EngineError> {
        let mut st = self.state.borrow_mut();
        if st.terminated { return Err(EngineError::Terminated); }
        Ok(st.inbox.pop_front())
    }

    fn terminate(&mut self) -> Result<(), EngineError> {
        let mut st = self.state.borrow_mut();
        st.terminated = true;
        st.inbox.clear();
        Ok(())
    }
}
