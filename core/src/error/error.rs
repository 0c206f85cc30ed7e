use thiserror::Error;

#[derive(Error, Debug)]
pub enum CliError {
    #[error("runner failed: {0}")]
    Runner(#[from] RunnerError),
    #[error("config error: {0}")]
    Config(String),
}

#[derive(Error, Debug)]
pub enum RunnerError {
    #[error("config error: {0}")]
    Config(String),
    #[error("spawn failed: {0}")]
    Spawn(String),
    #[error("stream io error: {stream} {source}")]
    StreamIo {
        stream: &'static str,
        source: std::io::Error,
    },
    #[error("plugin error: {0}")]
    Plugin(#[from] anyhow::Error),
}

impl RunnerError {
    pub fn stream(stream: &'static str, source: std::io::Error) -> Self {
        Self::StreamIo { stream, source }
    }

    /// Broken pipe on the child's stdin means the child stopped reading, usually because it exited.
    pub fn is_broken_pipe(&self) -> bool {
        matches!(
            self,
            Self::StreamIo { source, .. } if source.kind() == std::io::ErrorKind::BrokenPipe
        )
    }
}
