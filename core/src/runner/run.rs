use tokio::io::{AsyncRead, AsyncWrite};

use crate::config::RunnerConfig;
use crate::error::RunnerError;

use super::runtime;
use super::traits::RunnerSession;
use super::types::RunnerResult;

pub struct RunSessionArgs<'a> {
    pub session: Box<dyn RunnerSession>,
    pub runner: &'a RunnerConfig,
    pub parent_stdin: Box<dyn AsyncRead + Unpin + Send>,
    pub parent_stdout: Box<dyn AsyncWrite + Unpin + Send>,
}

impl<'a> RunSessionArgs<'a> {
    /// Wire the session to this process's own stdin/stdout.
    pub fn with_process_stdio(session: Box<dyn RunnerSession>, runner: &'a RunnerConfig) -> Self {
        Self {
            session,
            runner,
            parent_stdin: Box::new(tokio::io::stdin()),
            parent_stdout: Box::new(tokio::io::stdout()),
        }
    }
}

pub async fn run_session(args: RunSessionArgs<'_>) -> Result<RunnerResult, RunnerError> {
    if args.runner.read_buffer_bytes == 0 {
        return Err(RunnerError::Config(
            "read_buffer_bytes must be greater than zero".into(),
        ));
    }

    runtime::run_session_runtime(runtime::RunSessionRuntimeInput {
        session: args.session,
        parent_stdin: args.parent_stdin,
        parent_stdout: args.parent_stdout,
        read_buffer_bytes: args.runner.read_buffer_bytes,
        abort_grace_ms: args.runner.abort_grace_ms,
    })
    .await
}
