use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunOutcome {
    /// `None` when the process was terminated by a signal.
    pub exit_code: Option<i32>,
    /// Terminating signal number (Unix only).
    pub signal: Option<i32>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Signal {
    Kill,
    Term,
}

#[derive(Debug, Clone)]
pub struct RunnerStartArgs {
    pub cmd: String,
    pub args: Vec<String>,
    pub envs: HashMap<String, String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PumpStats {
    pub bytes_in: u64,
    pub bytes_out: u64,
}

#[derive(Debug, Clone)]
pub struct RunnerResult {
    pub exit_code: i32,
    pub duration_ms: u64,
    pub forwarded_bytes: u64,
    pub discarded_bytes: u64,
    /// Absolute offset in the child's stdout where the first `{` was seen.
    pub boundary_offset: Option<u64>,
}
