use super::{EngineError, Transport};
use log::{debug, info, warn};
use std::io::{self, BufRead, BufReader, Write};
use std::process::{Child, ChildStdin, Command, Stdio};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, TryRecvError};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

const QUIT_GRACE: Duration = Duration::from_millis(500);

/// A UCI engine running as a child process. A reader thread forwards each
/// stdout line over a channel so the owner never blocks on the pipe.
pub struct StockfishProcess {
    child: Child,
    stdin: Option<ChildStdin>,
    lines: Receiver<String>,
    reader: Option<JoinHandle<()>>,
    terminated: bool,
}

impl StockfishProcess {
    pub fn spawn(path: &str) -> Result<Self, EngineError> {
        let mut child = Command::new(path)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|source| EngineError::Spawn { path: path.to_string(), source })?;
        let stdin = child.stdin.take().ok_or(EngineError::Disconnected)?;
        let stdout = child.stdout.take().ok_or(EngineError::Disconnected)?;

        let (tx, rx) = mpsc::channel();
        let spawned = thread::Builder::new().name("engine-reader".to_string()).spawn(move || {
            for line in BufReader::new(stdout).lines() {
                let Ok(line) = line else { break };
                if tx.send(line).is_err() { break; }
            }
        });
        let reader = match spawned {
            Ok(handle) => handle,
            Err(e) => {
                warn!("cannot start engine reader thread, killing pid {}", child.id());
                if let Err(kill_err) = kill_and_reap(&mut child) {
                    warn!("failed to kill engine: {}", kill_err);
                }
                return Err(e.into());
            }
        };
        info!("spawned engine `{}` (pid {})", path, child.id());
        Ok(Self { child, stdin: Some(stdin), lines: rx, reader: Some(reader), terminated: false })
    }

    fn wait_for_exit(&mut self, grace: Duration) -> bool {
        let deadline = Instant::now() + grace;
        while Instant::now() < deadline {
            match self.child.try_wait() {
                Ok(Some(status)) => { debug!("engine exited: {}", status); return true; }
                Ok(None) => thread::sleep(Duration::from_millis(10)),
                Err(e) => { warn!("failed to poll engine process: {}", e); return false; }
            }
        }
        false
    }
}

fn kill_and_reap(child: &mut Child) -> io::Result<()> {
    child.kill()?;
    child.wait()?;
    Ok(())
}

impl Transport for StockfishProcess {
    fn send_line(&mut self, line: &str) -> Result<(), EngineError> {
        if self.terminated { return Err(EngineError::Terminated); }
        let stdin = self.stdin.as_mut().ok_or(EngineError::Disconnected)?;
        writeln!(stdin, "{}", line)?;
        stdin.flush()?;
        Ok(())
    }

    fn recv_line(&mut self, wait: Duration) -> Result<Option<String>, EngineError> {
        if self.terminated { return Err(EngineError::Terminated); }
        if wait.is_zero() {
            return match self.lines.try_recv() {
                Ok(line) => Ok(Some(line)),
                Err(TryRecvError::Empty) => Ok(None),
                Err(TryRecvError::Disconnected) => Err(EngineError::Disconnected),
            };
        }
        match self.lines.recv_timeout(wait) {
            Ok(line) => Ok(Some(line)),
            Err(RecvTimeoutError::Timeout) => Ok(None),
            Err(RecvTimeoutError::Disconnected) => Err(EngineError::Disconnected),
        }
    }

    fn terminate(&mut self) -> Result<(), EngineError> {
        if self.terminated { return Ok(()); }
        self.terminated = true;
        if let Some(mut stdin) = self.stdin.take() {
            // The engine may already be gone; a failed quit just means we kill it.
            let _ = writeln!(stdin, "quit").and_then(|_| stdin.flush());
        }
        if !self.wait_for_exit(QUIT_GRACE) {
            warn!("engine ignored quit, killing pid {}", self.child.id());
            kill_and_reap(&mut self.child)?;
        }
        if let Some(reader) = self.reader.take() {
            if reader.join().is_err() { warn!("engine reader thread panicked"); }
        }
        info!("engine terminated");
        Ok(())
    }
}

impl Drop for StockfishProcess {
    fn drop(&mut self) {
        if let Err(e) = self.terminate() { warn!("error while stopping engine: {}", e); }
    }
}
