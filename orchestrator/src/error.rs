use std::{fmt, io, path::PathBuf};

/// All errors that can occur in the orchestrator.
#[derive(Debug)]
pub enum OrchestratorError {
    /// Invalid configuration, caught before connecting.
    InvalidConfig(String),
    /// The image height can't be split evenly among the workers.
    Indivisible { height: usize, workers: usize },
    /// The input image couldn't be read.
    InputRead { path: PathBuf, source: io::Error },
    /// The input image isn't a grid of ±1 values.
    MalformedInput { line: usize, detail: String },
    /// The output image couldn't be written.
    OutputWrite { path: PathBuf, source: io::Error },
    /// Failed to connect to a worker.
    ConnectionFailed { addr: String, source: io::Error },
    /// A worker reported an unrecoverable error.
    WorkerError { rank: usize, msg: String },
    /// A worker sent something out of protocol.
    Protocol { rank: usize, detail: String },
    /// An underlying I/O error not covered by the above variants.
    Io(io::Error),
}

impl fmt::Display for OrchestratorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidConfig(msg) => write!(f, "invalid config: {msg}"),
            Self::Indivisible { height, workers } => write!(
                f,
                "the image height {height} is not divisible by the {workers} worker(s)"
            ),
            Self::InputRead { path, source } => {
                write!(f, "cannot read '{}': {source}", path.display())
            }
            Self::MalformedInput { line, detail } => {
                write!(f, "malformed input at line {line}: {detail}")
            }
            Self::OutputWrite { path, source } => {
                write!(f, "cannot write '{}': {source}", path.display())
            }
            Self::ConnectionFailed { addr, source } => {
                write!(f, "connection failed to {addr}: {source}")
            }
            Self::WorkerError { rank, msg } => write!(f, "worker {rank} error: {msg}"),
            Self::Protocol { rank, detail } => {
                write!(f, "protocol error with worker {rank}: {detail}")
            }
            Self::Io(e) => write!(f, "io error: {e}"),
        }
    }
}

impl std::error::Error for OrchestratorError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::InputRead { source, .. }
            | Self::OutputWrite { source, .. }
            | Self::ConnectionFailed { source, .. } => Some(source),
            Self::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<io::Error> for OrchestratorError {
    fn from(e: io::Error) -> Self {
        Self::Io(e)
    }
}

pub type Result<T> = std::result::Result<T, OrchestratorError>;
