use std::{error::Error, fmt, io};

/// The worker module's result type.
pub type Result<T> = std::result::Result<T, WorkerErr>;

/// Worker runtime failures.
#[derive(Debug)]
pub enum WorkerErr {
    Io(io::Error),
    InvalidParams(String),
    UnexpectedMessage {
        step: usize,
        got: &'static str,
    },
    RowLengthMismatch {
        step: usize,
        got: usize,
        expected: usize,
    },
    MalformedBand {
        width: usize,
        cells: usize,
    },
    TopologyMismatch {
        rank: usize,
        workers: usize,
        detail: &'static str,
    },
    LinkClosed {
        step: usize,
    },
    Remote(String),
}

impl fmt::Display for WorkerErr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WorkerErr::Io(e) => write!(f, "io error: {e}"),
            WorkerErr::InvalidParams(detail) => write!(f, "invalid run parameters: {detail}"),
            WorkerErr::UnexpectedMessage { step, got } => {
                write!(f, "unexpected message at step {step}: got {got}")
            }
            WorkerErr::RowLengthMismatch {
                step,
                got,
                expected,
            } => write!(
                f,
                "row length mismatch at step {step}: got {got}, expected {expected}"
            ),
            WorkerErr::MalformedBand { width, cells } => write!(
                f,
                "malformed band: {cells} cells don't make whole rows of {width}"
            ),
            WorkerErr::TopologyMismatch {
                rank,
                workers,
                detail,
            } => write!(f, "worker {rank} of {workers}: {detail}"),
            WorkerErr::LinkClosed { step } => {
                write!(f, "neighbour link closed at step {step}")
            }
            WorkerErr::Remote(detail) => write!(f, "remote error: {detail}"),
        }
    }
}

impl Error for WorkerErr {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            WorkerErr::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<io::Error> for WorkerErr {
    fn from(value: io::Error) -> Self {
        Self::Io(value)
    }
}

/// Lets the worker binary return `io::Result`.
impl From<WorkerErr> for io::Error {
    fn from(value: WorkerErr) -> Self {
        let kind = match value {
            WorkerErr::Io(e) => return e,
            WorkerErr::InvalidParams(_) | WorkerErr::TopologyMismatch { .. } => {
                io::ErrorKind::InvalidInput
            }
            WorkerErr::LinkClosed { .. } => io::ErrorKind::BrokenPipe,
            _ => io::ErrorKind::InvalidData,
        };

        io::Error::new(kind, value)
    }
}
