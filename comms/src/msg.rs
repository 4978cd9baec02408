use std::{borrow::Cow, io};

use crate::{
    Deserialize, Serialize,
    specs::worker::{WorkerReport, WorkerSpec},
};

type Header = u32;
const HEADER_SIZE: usize = size_of::<Header>();

const ERR_KIND: Header = 0;
const CONTROL_KIND: Header = 1;
const ROW_KIND: Header = 2;
const HALO_UPWARD_KIND: Header = 3;
const HALO_DOWNWARD_KIND: Header = 4;

/// The logical channel a halo row travels on between two adjacent workers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    /// A worker's first row, travelling to the neighbour above.
    Upward,
    /// A worker's last row, travelling to the neighbour below.
    Downward,
}

impl Direction {
    fn kind(self) -> Header {
        match self {
            Direction::Upward => HALO_UPWARD_KIND,
            Direction::Downward => HALO_DOWNWARD_KIND,
        }
    }
}

/// The payload data for the `Data` variant of the `Msg` enum.
#[derive(Debug)]
pub enum Payload<'a> {
    /// An image row exchanged between the orchestrator and a worker.
    Row(&'a [i32]),
    /// A boundary row exchanged between two adjacent workers.
    Halo(Direction, &'a [i32]),
}

/// The command for the `Control` variant of the `Msg` enum.
#[derive(Debug, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Command {
    CreateWorker(WorkerSpec),
    Neighbour { rank: usize },
    Report(WorkerReport),
    Disconnect,
}

/// The application layer message for the entire system.
#[derive(Debug)]
pub enum Msg<'a> {
    Control(Command),
    Data(Payload<'a>),
    Err(Cow<'a, str>),
}

impl Msg<'_> {
    /// A short name of the message kind, for logs and errors.
    pub fn kind(&self) -> &'static str {
        match self {
            Msg::Control(Command::CreateWorker(_)) => "control/create_worker",
            Msg::Control(Command::Neighbour { .. }) => "control/neighbour",
            Msg::Control(Command::Report(_)) => "control/report",
            Msg::Control(Command::Disconnect) => "control/disconnect",
            Msg::Data(Payload::Row(_)) => "data/row",
            Msg::Data(Payload::Halo(Direction::Upward, _)) => "data/halo_upward",
            Msg::Data(Payload::Halo(Direction::Downward, _)) => "data/halo_downward",
            Msg::Err(_) => "err",
        }
    }

    fn buf_is_too_small<T>(size: usize) -> io::Result<T> {
        Err(io::Error::new(
            io::ErrorKind::InvalidData,
            format!("The given buffer is too small {size}, must at least be {HEADER_SIZE} bytes"),
        ))
    }

    fn invalid_kind<T>(kind: Header) -> io::Result<T> {
        Err(io::Error::new(
            io::ErrorKind::InvalidData,
            format!("Received an invalid message kind {kind}"),
        ))
    }
}

impl<'a> Serialize<'a> for Msg<'a> {
    fn serialize(&'a self, buf: &mut Vec<u8>) -> Option<&'a [u8]> {
        match self {
            Msg::Err(e) => {
                buf.extend_from_slice(&ERR_KIND.to_be_bytes());
                Some(e.as_bytes())
            }
            Msg::Control(cmd) => {
                buf.extend_from_slice(&CONTROL_KIND.to_be_bytes());

                // SAFETY: Serialize impl for `Command` is derived and not implemented
                //         by hand. Nor has a non string-key map inside.
                serde_json::to_writer(buf, &cmd).unwrap();
                None
            }
            Msg::Data(payload) => {
                let (kind, row) = match payload {
                    Payload::Row(row) => (ROW_KIND, row),
                    Payload::Halo(direction, row) => (direction.kind(), row),
                };

                buf.extend_from_slice(&kind.to_be_bytes());
                Some(bytemuck::cast_slice(row))
            }
        }
    }
}

impl<'a> Deserialize<'a> for Msg<'a> {
    fn deserialize(buf: &'a mut [u8]) -> io::Result<Self> {
        let buf: &'a [u8] = buf;

        let Some((kind, rest)) = buf.split_first_chunk::<HEADER_SIZE>() else {
            return Self::buf_is_too_small(buf.len());
        };

        match Header::from_be_bytes(*kind) {
            ERR_KIND => {
                let string = std::str::from_utf8(rest)
                    .map_err(|err| io::Error::new(io::ErrorKind::InvalidData, err))?;

                Ok(Self::Err(Cow::Borrowed(string)))
            }
            CONTROL_KIND => {
                let cmd = serde_json::from_slice(rest)?;
                Ok(Self::Control(cmd))
            }
            kind @ (ROW_KIND | HALO_UPWARD_KIND | HALO_DOWNWARD_KIND) => {
                let row = bytemuck::try_cast_slice(rest).map_err(|err| {
                    io::Error::new(
                        io::ErrorKind::InvalidData,
                        format!("Received a malformed row of {} bytes: {err:?}", rest.len()),
                    )
                })?;

                let payload = match kind {
                    ROW_KIND => Payload::Row(row),
                    HALO_UPWARD_KIND => Payload::Halo(Direction::Upward, row),
                    _ => Payload::Halo(Direction::Downward, row),
                };

                Ok(Self::Data(payload))
            }
            kind => Self::invalid_kind(kind),
        }
    }
}
