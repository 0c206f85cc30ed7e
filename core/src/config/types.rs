use std::collections::HashMap;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub logging: LoggingConfig,

    #[serde(default)]
    pub runner: RunnerConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_logging_enabled")]
    pub enabled: bool,

    /// If true, log to stderr. Stdout is the protocol channel and never receives logs.
    #[serde(default = "default_logging_console")]
    pub console: bool,

    /// If true, log to a file under `directory` (or OS temp dir if unset).
    #[serde(default = "default_logging_file")]
    pub file: bool,

    /// EnvFilter string, e.g. "warn" or "boundary_core=debug".
    #[serde(default = "default_logging_level")]
    pub level: String,

    /// Optional directory for log files. If empty or unset, uses OS temp dir.
    #[serde(default)]
    pub directory: Option<String>,
}

fn default_logging_enabled() -> bool {
    true
}

fn default_logging_console() -> bool {
    true
}

fn default_logging_file() -> bool {
    false
}

fn default_logging_level() -> String {
    "warn".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            enabled: default_logging_enabled(),
            console: default_logging_console(),
            file: default_logging_file(),
            level: default_logging_level(),
            directory: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunnerConfig {
    /// Size of the read buffer used by both stream pumps; one chunk never exceeds it.
    #[serde(default = "default_read_buffer_bytes")]
    pub read_buffer_bytes: usize,

    /// Extra environment variables for the child, on top of the inherited environment.
    #[serde(default)]
    pub env: HashMap<String, String>,

    /// How long a child gets to exit after SIGTERM during teardown before it is killed.
    /// Also caps how long child stdout is drained after the child has exited.
    #[serde(default = "default_abort_grace_ms")]
    pub abort_grace_ms: u64,
}

pub const DEFAULT_READ_BUFFER_BYTES: usize = 16 * 1024;

fn default_read_buffer_bytes() -> usize {
    DEFAULT_READ_BUFFER_BYTES
}

fn default_abort_grace_ms() -> u64 {
    500
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            read_buffer_bytes: default_read_buffer_bytes(),
            env: HashMap::new(),
            abort_grace_ms: default_abort_grace_ms(),
        }
    }
}

impl AppConfig {
    pub fn validate(&self) -> Result<(), String> {
        if self.runner.read_buffer_bytes == 0 {
            return Err("runner.read_buffer_bytes must be greater than zero".to_string());
        }
        if let Some(key) = self.runner.env.keys().find(|k| k.trim().is_empty()) {
            return Err(format!("runner.env contains an empty key ({key:?})"));
        }
        Ok(())
    }
}
