use comms::{
    FrameReceiver,
    msg::{Command, Msg},
    specs::worker::WorkerSpec,
};
use log::{debug, info, warn};
use rand::rngs::StdRng;
use tokio::io::AsyncRead;

use crate::{
    Partition, Result, RunParams, Worker, WorkerErr,
    halo::HaloLink,
    metropolis::{Metropolis, RandomProposer},
    params,
    topology::{Position, Topology},
};

/// The worker every spec resolves to, drawing its proposals from a seeded `StdRng`.
pub type SpecWorker<L> = Worker<L, RandomProposer<StdRng>>;

pub struct WorkerBuilder;

impl WorkerBuilder {
    /// Waits for the orchestrator's `CreateWorker` message.
    ///
    /// # Args
    /// * `rx` - Receiving end of the orchestrator channel.
    ///
    /// # Returns
    /// The received spec, or `None` if the orchestrator disconnected before sending one.
    pub async fn handshake<R>(rx: &mut FrameReceiver<R>) -> Result<Option<WorkerSpec>>
    where
        R: AsyncRead + Unpin,
    {
        info!("waiting for CreateWorker spec");
        let mut rx_buf: Vec<u32> = Vec::new();

        loop {
            match rx.recv_into(&mut rx_buf).await? {
                Msg::Control(Command::CreateWorker(spec)) => {
                    debug!(
                        rank = spec.rank,
                        workers = spec.workers,
                        rows = spec.rows,
                        iterations = spec.iterations;
                        "received worker spec"
                    );
                    return Ok(Some(spec));
                }
                Msg::Control(Command::Disconnect) => {
                    info!("received Disconnect before bootstrap, exiting");
                    return Ok(None);
                }
                msg => warn!("expected CreateWorker, got {}", msg.kind()),
            }
        }
    }

    /// The position described by `spec`.
    pub fn position(spec: &WorkerSpec) -> Result<Position> {
        Position::new(spec.rank, spec.workers)
    }

    /// Builds a `Worker` from a `WorkerSpec`.
    ///
    /// # Args
    /// * `spec` - Bootstrap specification received from the orchestrator.
    /// * `params` - The validated run parameters of `spec`.
    /// * `topology` - The worker's position and neighbour links.
    /// * `partition` - The band received from the orchestrator.
    ///
    /// # Returns
    /// A fully initialized `Worker` instance, or an error if the band doesn't match the spec.
    pub fn build<L>(
        spec: &WorkerSpec,
        params: RunParams,
        topology: Topology<L>,
        partition: Partition,
    ) -> Result<SpecWorker<L>>
    where
        L: HaloLink + Send,
    {
        if partition.width() != spec.width || partition.rows() != spec.rows {
            return Err(WorkerErr::RowLengthMismatch {
                step: 0,
                got: partition.rows() * partition.width(),
                expected: spec.rows * spec.width,
            });
        }

        let rng = params::worker_rng(spec.seed, spec.rank);
        let worker = Worker::new(
            topology,
            partition,
            Metropolis::new(&params),
            RandomProposer::new(rng),
            spec.iterations,
        );

        Ok(worker)
    }
}
