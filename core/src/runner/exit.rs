use super::types::RunOutcome;

/// Exit code the filter should report for a finished child.
///
/// A normal exit passes through unchanged. A child killed by a signal maps to
/// `128 + signal`, the shell convention. Anything else is a generic failure.
pub fn exit_code_from_outcome(outcome: &RunOutcome) -> i32 {
    match (outcome.exit_code, outcome.signal) {
        (Some(code), _) => code,
        (None, Some(sig)) => 128 + sig,
        (None, None) => 1,
    }
}
