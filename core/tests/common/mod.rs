use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use boundary_core::runner::{RunOutcome, RunnerSession, Signal};
use tokio::io::{AsyncRead, AsyncWrite, DuplexStream};
use tokio::sync::{oneshot, Notify};

/// In-process stand-in for a spawned child, backed by duplex pipes.
pub struct FakeSession {
    stdin: Option<DuplexStream>,
    stdout: Option<DuplexStream>,
    exit_rx: Option<oneshot::Receiver<i32>>,
    kill: Arc<Notify>,
    outcome: Option<RunOutcome>,
    pub signals: Arc<Mutex<Vec<Signal>>>,
}

/// The "child" half: what the fake child reads, writes and how it exits.
pub struct ChildEnd {
    pub stdin: DuplexStream,
    pub stdout: DuplexStream,
    pub exit_tx: oneshot::Sender<i32>,
}

pub fn fake_session() -> (FakeSession, ChildEnd) {
    let (filter_stdin, child_stdin) = tokio::io::duplex(4096);
    let (child_stdout, filter_stdout) = tokio::io::duplex(4096);
    let (exit_tx, exit_rx) = oneshot::channel();

    let session = FakeSession {
        stdin: Some(filter_stdin),
        stdout: Some(filter_stdout),
        exit_rx: Some(exit_rx),
        kill: Arc::new(Notify::new()),
        outcome: None,
        signals: Arc::new(Mutex::new(Vec::new())),
    };
    let child = ChildEnd {
        stdin: child_stdin,
        stdout: child_stdout,
        exit_tx,
    };
    (session, child)
}

#[async_trait]
impl RunnerSession for FakeSession {
    fn stdin(&mut self) -> Option<Box<dyn AsyncWrite + Unpin + Send>> {
        self.stdin
            .take()
            .map(|s| Box::new(s) as Box<dyn AsyncWrite + Unpin + Send>)
    }

    fn stdout(&mut self) -> Option<Box<dyn AsyncRead + Unpin + Send>> {
        self.stdout
            .take()
            .map(|s| Box::new(s) as Box<dyn AsyncRead + Unpin + Send>)
    }

    async fn signal(&mut self, signal: Signal) -> anyhow::Result<()> {
        self.signals.lock().unwrap().push(signal);
        self.kill.notify_one();
        Ok(())
    }

    async fn wait(&mut self) -> anyhow::Result<RunOutcome> {
        if let Some(o) = self.outcome {
            return Ok(o);
        }

        let exit_rx = &mut self.exit_rx;
        let kill = &self.kill;
        let outcome = tokio::select! {
            code = async {
                match exit_rx.as_mut() {
                    Some(rx) => rx.await.unwrap_or(1),
                    None => std::future::pending().await,
                }
            } => RunOutcome { exit_code: Some(code), signal: None },
            _ = kill.notified() => RunOutcome { exit_code: None, signal: Some(15) },
        };

        self.outcome = Some(outcome);
        Ok(outcome)
    }
}
