use async_trait::async_trait;
use tokio::io::{AsyncRead, AsyncWrite};

use super::types::{RunOutcome, RunnerStartArgs, Signal};

/// A spawned child whose stdin/stdout the filter owns.
///
/// Each stream accessor hands the stream out once; later calls return `None`.
#[async_trait]
pub trait RunnerSession: Send {
    fn stdin(&mut self) -> Option<Box<dyn AsyncWrite + Unpin + Send>>;
    fn stdout(&mut self) -> Option<Box<dyn AsyncRead + Unpin + Send>>;
    async fn signal(&mut self, signal: Signal) -> anyhow::Result<()>;
    async fn wait(&mut self) -> anyhow::Result<RunOutcome>;
}

#[async_trait]
pub trait RunnerPlugin: Send + Sync {
    fn name(&self) -> &str;
    async fn start_session(&self, args: &RunnerStartArgs)
        -> anyhow::Result<Box<dyn RunnerSession>>;
}
