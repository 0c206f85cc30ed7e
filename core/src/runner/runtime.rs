//! Runner runtime：负责 stdin/stdout 泵送、等待子进程退出，以及流错误时的中止与退出码归一。
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::io::{AsyncRead, AsyncWrite};
use tokio::sync::Notify;
use tokio::task::JoinError;

use crate::error::RunnerError;

use super::abort;
use super::exit::exit_code_from_outcome;
use super::io_pump::{self, StdoutReport};
use super::traits::RunnerSession;
use super::types::{RunOutcome, RunnerResult};

pub struct RunSessionRuntimeInput {
    pub session: Box<dyn RunnerSession>,
    pub parent_stdin: Box<dyn AsyncRead + Unpin + Send>,
    pub parent_stdout: Box<dyn AsyncWrite + Unpin + Send>,
    pub read_buffer_bytes: usize,
    pub abort_grace_ms: u64,
}

enum Ended {
    Child(anyhow::Result<RunOutcome>),
    Failed(RunnerError),
}

fn joined<T>(res: Result<Result<T, RunnerError>, JoinError>) -> Result<T, RunnerError> {
    res.map_err(|e| RunnerError::Plugin(anyhow::anyhow!("pump task failed: {e}")))?
}

pub async fn run_session_runtime(
    input: RunSessionRuntimeInput,
) -> Result<RunnerResult, RunnerError> {
    let RunSessionRuntimeInput {
        mut session,
        parent_stdin,
        parent_stdout,
        read_buffer_bytes,
        abort_grace_ms,
    } = input;

    let stdout = session
        .stdout()
        .ok_or_else(|| RunnerError::Spawn("no stdout".into()))?;
    let stdin = session
        .stdin()
        .ok_or_else(|| RunnerError::Spawn("no stdin".into()))?;

    let started_at = Instant::now();

    let stop_stdout = Arc::new(Notify::new());
    let mut out_task = io_pump::pump_child_stdout_until(
        stdout,
        parent_stdout,
        read_buffer_bytes,
        stop_stdout.clone(),
    );
    let mut in_task = io_pump::pump_parent_stdin(parent_stdin, stdin, read_buffer_bytes);

    let mut stdout_report: Option<StdoutReport> = None;
    let mut stdin_done = false;

    let ended = {
        let wait_fut = session.wait();
        tokio::pin!(wait_fut);

        loop {
            tokio::select! {
                biased;

                res = &mut wait_fut => {
                    break Ended::Child(res);
                }

                res = &mut out_task, if stdout_report.is_none() => {
                    match joined(res) {
                        // Child closed stdout; its exit status is still pending.
                        Ok(report) => stdout_report = Some(report),
                        Err(e) => break Ended::Failed(e),
                    }
                }

                res = &mut in_task, if !stdin_done => {
                    stdin_done = true;
                    match joined(res) {
                        Ok(stats) => {
                            tracing::debug!(bytes = stats.bytes_out, "stdin forwarding finished");
                        }
                        Err(e) if e.is_broken_pipe() => {
                            // The child stopped reading; its exit status decides the outcome.
                            tracing::debug!(error = %e, "child closed its stdin");
                        }
                        Err(e) => break Ended::Failed(e),
                    }
                }
            }
        }
    };

    let outcome = match ended {
        Ended::Failed(e) => {
            tracing::error!(error.kind = "stream.failed", error.message = %e);
            in_task.abort();
            out_task.abort();
            if let Some(reaped) =
                abort::abort_sequence(&mut session, abort_grace_ms, &e.to_string()).await
            {
                tracing::debug!(
                    exit_code = ?reaped.exit_code,
                    signal = ?reaped.signal,
                    "child reaped after teardown"
                );
            }
            return Err(e);
        }
        Ended::Child(res) => res.map_err(RunnerError::Plugin)?,
    };

    // Parent stdin may never reach EOF; the child is gone so nothing reads it anymore.
    in_task.abort();

    // Drain what the child wrote before exiting. A descendant may still hold the
    // pipe open, so the drain gets at most abort_grace_ms before it is stopped.
    let report = match stdout_report {
        Some(r) => r,
        None => match tokio::time::timeout(Duration::from_millis(abort_grace_ms), &mut out_task)
            .await
        {
            Ok(res) => joined(res)?,
            Err(_) => {
                tracing::debug!(abort_grace_ms, "child stdout still open after exit, stopping drain");
                stop_stdout.notify_one();
                joined(out_task.await)?
            }
        },
    };

    let exit_code = exit_code_from_outcome(&outcome);
    let duration_ms = started_at.elapsed().as_millis() as u64;

    tracing::info!(
        exit_code,
        signal = ?outcome.signal,
        duration_ms,
        forwarded = report.stats.bytes_out,
        drain_stopped = report.stopped_early,
        "child exited"
    );

    Ok(RunnerResult {
        exit_code,
        duration_ms,
        forwarded_bytes: report.stats.bytes_out,
        discarded_bytes: report.stats.bytes_in - report.stats.bytes_out,
        boundary_offset: report.boundary_offset,
    })
}
