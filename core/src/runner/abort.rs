use std::time::Duration;

use super::traits::RunnerSession;
use super::types::{RunOutcome, Signal};

/// Tear the child down after a stream failure: SIGTERM, a short grace, then kill.
///
/// Always reaps the child so no zombie outlives the filter.
pub async fn abort_sequence(
    session: &mut Box<dyn RunnerSession>,
    abort_grace_ms: u64,
    reason: &str,
) -> Option<RunOutcome> {
    tracing::warn!(error.kind = "runner.abort", reason, "tearing down child process");

    if let Err(e) = session.signal(Signal::Term).await {
        tracing::debug!(error = %e, "term signal failed");
    }

    match tokio::time::timeout(Duration::from_millis(abort_grace_ms), session.wait()).await {
        Ok(Ok(outcome)) => return Some(outcome),
        Ok(Err(e)) => tracing::warn!(error = %e, "wait after term failed"),
        Err(_) => tracing::debug!(abort_grace_ms, "child still running after grace, killing"),
    }

    if let Err(e) = session.signal(Signal::Kill).await {
        tracing::warn!(error = %e, "kill failed");
    }
    match session.wait().await {
        Ok(outcome) => Some(outcome),
        Err(e) => {
            tracing::warn!(error = %e, "wait after kill failed");
            None
        }
    }
}
