//! Wires up a worker process over tcp: the orchestrator's connection and both neighbours.

use std::net::SocketAddr;

use comms::{
    FrameReceiver, FrameSender,
    msg::{Command, Msg},
    specs::worker::WorkerSpec,
};
use log::{info, warn};
use tokio::net::{
    TcpListener, TcpStream,
    tcp::{OwnedReadHalf, OwnedWriteHalf},
};

use crate::{
    Result, WorkerBuilder, WorkerErr,
    halo::NetLink,
    topology::{Position, Topology},
};

pub type NetRx = FrameReceiver<OwnedReadHalf>;
pub type NetTx = FrameSender<OwnedWriteHalf>;
pub type TcpLink = NetLink<OwnedReadHalf, OwnedWriteHalf>;

/// Everything a worker process needs to serve a run.
pub struct Bootstrap {
    pub spec: WorkerSpec,
    pub rx: NetRx,
    pub tx: NetTx,
    pub topology: Topology<TcpLink>,
}

/// Accepts the orchestrator and the neighbour above on `listener`, and connects to the
/// neighbour below.
///
/// Incoming connections are told apart by their first message, the orchestrator sends
/// `CreateWorker` and the neighbour above sends `Neighbour`.
///
/// # Args
/// * `listener` - The worker's listener.
///
/// # Returns
/// The bootstrapped worker, `None` if the orchestrator disconnected before sending a spec.
pub async fn bootstrap(listener: &TcpListener) -> Result<Option<Bootstrap>> {
    let mut orchestrator: Option<(NetRx, NetTx, WorkerSpec)> = None;
    let mut above: Option<(TcpLink, usize)> = None;
    let mut rx_buf: Vec<u32> = Vec::new();

    let (rx, tx, spec) = loop {
        if let Some((rx, tx, spec)) = orchestrator.take() {
            if spec.rank == 1 || above.is_some() {
                break (rx, tx, spec);
            }

            orchestrator = Some((rx, tx, spec));
        }

        let (stream, addr) = listener.accept().await?;
        stream.set_nodelay(true)?;

        let (rx, tx) = stream.into_split();
        let (mut rx, tx) = comms::channel(rx, tx);

        match rx.recv_into(&mut rx_buf).await? {
            Msg::Control(Command::CreateWorker(spec)) => {
                info!(rank = spec.rank; "orchestrator connected from {addr}");
                orchestrator = Some((rx, tx, spec));
            }
            Msg::Control(Command::Neighbour { rank }) => {
                info!(rank = rank; "neighbour above connected from {addr}");
                above = Some((NetLink::new(rx, tx), rank));
            }
            Msg::Control(Command::Disconnect) if orchestrator.is_none() => {
                info!("received Disconnect before bootstrap, exiting");
                return Ok(None);
            }
            msg => warn!("expected CreateWorker or Neighbour from {addr}, got {}", msg.kind()),
        }
    };

    let position = WorkerBuilder::position(&spec)?;
    let above = match above {
        Some((link, rank)) if rank + 1 == position.rank() => Some(link),
        Some(_) => {
            return Err(WorkerErr::TopologyMismatch {
                rank: position.rank(),
                workers: position.workers(),
                detail: "the neighbour above announced an unexpected rank",
            });
        }
        None => None,
    };

    let below = match spec.below {
        Some(addr) => Some(connect_below(addr, position).await?),
        None => None,
    };

    let topology = Topology::new(position, above, below)?;

    Ok(Some(Bootstrap {
        spec,
        rx,
        tx,
        topology,
    }))
}

/// Connects to the neighbour below and announces this worker's rank.
async fn connect_below(addr: SocketAddr, position: Position) -> Result<TcpLink> {
    let stream = TcpStream::connect(addr).await?;
    stream.set_nodelay(true)?;

    let (rx, tx) = stream.into_split();
    let (rx, mut tx) = comms::channel(rx, tx);

    let msg = Msg::Control(Command::Neighbour {
        rank: position.rank(),
    });
    tx.send(&msg).await?;

    info!(rank = position.rank(); "connected to the neighbour below at {addr}");
    Ok(NetLink::new(rx, tx))
}
