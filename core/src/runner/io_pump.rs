use std::sync::Arc;

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::sync::Notify;
use tokio::task::JoinHandle;

use crate::error::RunnerError;

use super::boundary::BoundaryScanner;
use super::types::PumpStats;

pub const FLOW_AUDIT_ENV: &str = "STDIO_BOUNDARY_FLOW_AUDIT";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StdoutReport {
    pub stats: PumpStats,
    pub boundary_offset: Option<u64>,
    /// The pump was told to stop before the child's stdout reached EOF.
    pub stopped_early: bool,
}

pub(crate) fn flow_audit_enabled<F>(get: F) -> bool
where
    F: Fn(&str) -> Option<String>,
{
    get(FLOW_AUDIT_ENV)
        .map(|v| {
            let v = v.trim();
            !v.is_empty() && v != "0"
        })
        .unwrap_or(false)
}

fn audit_preview(bytes: &[u8]) -> String {
    const MAX: usize = 120;
    let s = String::from_utf8_lossy(&bytes[..bytes.len().min(MAX)]);
    let mut out = s.escape_debug().to_string();
    if bytes.len() > MAX {
        out.push('…');
    }
    out
}

/// Child stdout -> parent stdout, through a [`BoundaryScanner`].
///
/// Runs until the child closes its stdout. Every forwarded slice is flushed
/// right away so the parent sees protocol messages without delay.
pub fn pump_child_stdout<R, W>(
    rd: R,
    wr: W,
    buf_size: usize,
) -> JoinHandle<Result<StdoutReport, RunnerError>>
where
    R: AsyncRead + Unpin + Send + 'static,
    W: AsyncWrite + Unpin + Send + 'static,
{
    pump_child_stdout_until(rd, wr, buf_size, Arc::new(Notify::new()))
}

/// Like [`pump_child_stdout`], but also returns once `stop` is notified.
///
/// A descendant of the child can keep the stdout pipe open after the child
/// itself has exited; `stop` ends the pump without waiting for that EOF. A
/// notification sent before the pump starts waiting is not lost.
pub fn pump_child_stdout_until<R, W>(
    rd: R,
    wr: W,
    buf_size: usize,
    stop: Arc<Notify>,
) -> JoinHandle<Result<StdoutReport, RunnerError>>
where
    R: AsyncRead + Unpin + Send + 'static,
    W: AsyncWrite + Unpin + Send + 'static,
{
    let flow_audit = flow_audit_enabled(|k| std::env::var(k).ok());
    tokio::spawn(stdout_pump(rd, wr, buf_size, stop, flow_audit))
}

async fn stdout_pump<R, W>(
    mut rd: R,
    mut wr: W,
    buf_size: usize,
    stop: Arc<Notify>,
    flow_audit: bool,
) -> Result<StdoutReport, RunnerError>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut buf = vec![0u8; buf_size.max(1)];
    let mut scanner = BoundaryScanner::new();
    let mut stats = PumpStats::default();
    let mut stopped_early = false;

    loop {
        let n = tokio::select! {
            biased;

            res = rd.read(&mut buf) => {
                res.map_err(|e| RunnerError::stream("child_stdout", e))?
            }
            _ = stop.notified() => {
                stopped_early = true;
                break;
            }
        };
        if n == 0 {
            break;
        }
        stats.bytes_in += n as u64;

        let was_forwarding = scanner.is_forwarding();
        let out = scanner.filter(&buf[..n]);

        if !was_forwarding {
            if flow_audit {
                tracing::debug!(
                    target: "boundary.flow",
                    stage = "scan",
                    bytes = n,
                    forwarded = out.len(),
                    preview = %audit_preview(&buf[..n])
                );
            }
            if scanner.is_forwarding() {
                tracing::info!(
                    stream = "child_stdout",
                    offset = scanner.boundary_offset().unwrap_or_default(),
                    discarded = scanner.discarded_bytes(),
                    "protocol boundary found, forwarding"
                );
            } else {
                tracing::debug!(stream = "child_stdout", bytes = n, "discarded pre-protocol output");
            }
        }

        if out.is_empty() {
            continue;
        }

        wr.write_all(out)
            .await
            .map_err(|e| RunnerError::stream("parent_stdout", e))?;
        wr.flush()
            .await
            .map_err(|e| RunnerError::stream("parent_stdout", e))?;
        stats.bytes_out += out.len() as u64;
    }

    if stopped_early {
        tracing::debug!(
            stream = "child_stdout",
            bytes = stats.bytes_out,
            "stopped before EOF, child stdout still held open"
        );
    } else if !scanner.is_forwarding() {
        tracing::warn!(
            stream = "child_stdout",
            discarded = scanner.discarded_bytes(),
            "child stdout closed before any protocol output"
        );
    } else {
        tracing::debug!(stream = "child_stdout", bytes = stats.bytes_out, "child stdout EOF");
    }

    Ok(StdoutReport {
        stats,
        boundary_offset: scanner.boundary_offset(),
        stopped_early,
    })
}

/// Parent stdin -> child stdin, verbatim.
///
/// On EOF the child's stdin is shut down and dropped, which is how the child
/// learns the parent has gone away.
pub fn pump_parent_stdin<R, W>(
    mut rd: R,
    mut wr: W,
    buf_size: usize,
) -> JoinHandle<Result<PumpStats, RunnerError>>
where
    R: AsyncRead + Unpin + Send + 'static,
    W: AsyncWrite + Unpin + Send + 'static,
{
    tokio::spawn(async move {
        let mut buf = vec![0u8; buf_size.max(1)];
        let mut stats = PumpStats::default();

        loop {
            let n = rd
                .read(&mut buf)
                .await
                .map_err(|e| RunnerError::stream("parent_stdin", e))?;
            if n == 0 {
                break;
            }
            stats.bytes_in += n as u64;

            wr.write_all(&buf[..n])
                .await
                .map_err(|e| RunnerError::stream("child_stdin", e))?;
            wr.flush()
                .await
                .map_err(|e| RunnerError::stream("child_stdin", e))?;
            stats.bytes_out += n as u64;
        }

        tracing::debug!(stream = "parent_stdin", bytes = stats.bytes_in, "parent stdin EOF, closing child stdin");
        // Shutdown may fail if the child already exited; dropping still closes the pipe.
        if let Err(e) = wr.shutdown().await {
            tracing::debug!(stream = "child_stdin", error = %e, "shutdown after EOF failed");
        }
        drop(wr);

        Ok(stats)
    })
}
