//! Workers running as tasks of the orchestrator's own process.

use std::io;

use comms::{FrameReceiver, FrameSender, specs::worker::WorkerReport};
use log::{debug, warn};
use tokio::{
    io::{DuplexStream, ReadHalf, WriteHalf},
    task::JoinSet,
};
use worker::{
    WorkerBuilder, WorkerErr,
    halo::{RendezvousLink, rendezvous},
    service,
    topology::Topology,
};

use crate::{
    error::{OrchestratorError, Result},
    session::Session,
};

const CHANNEL_BUF_SIZE: usize = 64 * 1024;

type LocalRx = FrameReceiver<ReadHalf<DuplexStream>>;
type LocalTx = FrameSender<WriteHalf<DuplexStream>>;

/// The session type driving a `LocalCluster`.
pub type LocalSession = Session<ReadHalf<DuplexStream>, WriteHalf<DuplexStream>>;

/// A chain of in-process workers, each adjacent pair joined by a rendezvous link.
pub struct LocalCluster {
    tasks: JoinSet<(usize, worker::Result<Option<WorkerReport>>)>,
}

impl LocalCluster {
    /// Spawns `workers` workers waiting for their spec.
    ///
    /// # Returns
    /// The cluster and a session holding a channel to each of its workers.
    pub fn spawn(workers: usize) -> (Self, LocalSession) {
        let mut aboves: Vec<Option<RendezvousLink>> = (0..workers).map(|_| None).collect();
        let mut belows: Vec<Option<RendezvousLink>> = (0..workers).map(|_| None).collect();

        for i in 1..workers {
            let (upper, lower) = rendezvous();
            belows[i - 1] = Some(upper);
            aboves[i] = Some(lower);
        }

        let mut tasks = JoinSet::new();
        let mut channels = Vec::with_capacity(workers);

        for (i, (above, below)) in aboves.into_iter().zip(belows).enumerate() {
            let rank = i + 1;
            let (orch_stream, wk_stream) = tokio::io::duplex(CHANNEL_BUF_SIZE);

            let (rx, tx) = tokio::io::split(orch_stream);
            channels.push(comms::channel(rx, tx));

            let (rx, tx) = tokio::io::split(wk_stream);
            let (mut rx, mut tx) = comms::channel(rx, tx);

            tasks.spawn(async move {
                let result = serve_local(rank, &mut rx, &mut tx, above, below).await;
                (rank, result)
            });
        }

        debug!(workers = workers; "spawned local workers");
        (Self { tasks }, Session::new(channels))
    }

    /// Waits for every worker to finish.
    ///
    /// A failing worker takes its neighbours down with it, they then fail on a closed
    /// link or channel. Those failures are only reported when no worker failed on its own.
    ///
    /// # Returns
    /// The first failure among the workers, if any.
    pub async fn join(mut self) -> Result<()> {
        let mut cause = None;
        let mut knock_on = None;

        while let Some(joined) = self.tasks.join_next().await {
            match joined {
                Ok((_, Ok(_))) => {}
                Ok((rank, Err(e))) => {
                    warn!(rank = rank; "local worker failed: {e}");

                    let slot = match e {
                        WorkerErr::LinkClosed { .. } | WorkerErr::Remote(_) | WorkerErr::Io(_) => {
                            &mut knock_on
                        }
                        _ => &mut cause,
                    };
                    slot.get_or_insert(OrchestratorError::WorkerError {
                        rank,
                        msg: e.to_string(),
                    });
                }
                Err(e) => {
                    cause.get_or_insert(OrchestratorError::Io(io::Error::other(e)));
                }
            }
        }

        cause.or(knock_on).map_or(Ok(()), Err)
    }
}

/// Runs the worker at `rank` once its spec arrives.
async fn serve_local(
    rank: usize,
    rx: &mut LocalRx,
    tx: &mut LocalTx,
    above: Option<RendezvousLink>,
    below: Option<RendezvousLink>,
) -> worker::Result<Option<WorkerReport>> {
    let Some(spec) = WorkerBuilder::handshake(rx).await? else {
        return Ok(None);
    };

    let position = WorkerBuilder::position(&spec)?;
    if position.rank() != rank {
        return Err(WorkerErr::TopologyMismatch {
            rank: spec.rank,
            workers: spec.workers,
            detail: "spec sent to the wrong local worker",
        });
    }

    let topology = Topology::new(position, above, below)?;
    service::serve(&spec, rx, tx, topology).await.map(Some)
}
