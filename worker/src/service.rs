//! The worker side of a run: receive the band, sample it, send it back.

use std::borrow::Cow;

use comms::{
    FrameReceiver, FrameSender,
    msg::{Command, Msg, Payload},
    specs::worker::{WorkerReport, WorkerSpec},
};
use log::{info, warn};
use tokio::io::{AsyncRead, AsyncWrite};

use crate::{
    Partition, Result, RunParams, WorkerBuilder, WorkerErr, halo::HaloLink, topology::Topology,
};

/// Serves a whole run for the orchestrator on the other end of `rx` and `tx`.
///
/// Receives `spec.rows` rows, samples them for `spec.iterations` rounds, sends
/// the rows back in order followed by a `Report` and a `Disconnect`. On failure the
/// orchestrator is sent an `Err` message before returning the error.
///
/// # Args
/// * `spec` - The worker's bootstrap specification.
/// * `rx` - Receiving end of the orchestrator channel.
/// * `tx` - Sending end of the orchestrator channel.
/// * `topology` - The worker's position and neighbour links.
///
/// # Returns
/// The report sent to the orchestrator.
pub async fn serve<R, W, L>(
    spec: &WorkerSpec,
    rx: &mut FrameReceiver<R>,
    tx: &mut FrameSender<W>,
    topology: Topology<L>,
) -> Result<WorkerReport>
where
    R: AsyncRead + Unpin + Send,
    W: AsyncWrite + Unpin + Send,
    L: HaloLink + Send,
{
    match run_band(spec, rx, tx, topology).await {
        Ok(report) => Ok(report),
        Err(e) => {
            warn!(rank = spec.rank; "worker failed: {e}");

            let detail = format!("worker {}: {e}", spec.rank);
            if let Err(send_err) = tx.send(&Msg::Err(Cow::Borrowed(detail.as_str()))).await {
                warn!(rank = spec.rank; "couldn't report the failure: {send_err}");
            }

            Err(e)
        }
    }
}

async fn run_band<R, W, L>(
    spec: &WorkerSpec,
    rx: &mut FrameReceiver<R>,
    tx: &mut FrameSender<W>,
    topology: Topology<L>,
) -> Result<WorkerReport>
where
    R: AsyncRead + Unpin + Send,
    W: AsyncWrite + Unpin + Send,
    L: HaloLink + Send,
{
    let params = RunParams::new(spec.beta, spec.pi)?;
    let partition = recv_band(spec, rx).await?;
    info!(rank = spec.rank; "received {} rows", partition.rows());

    let worker = WorkerBuilder::build(spec, params, topology, partition)?;
    let (partition, metrics) = worker.run().await?;

    tx.send_rows(partition.iter_rows()).await?;

    let report = WorkerReport {
        rank: spec.rank,
        iterations: metrics.steps as usize,
        flips: metrics.flips,
    };

    tx.send(&Msg::Control(Command::Report(report))).await?;
    tx.send(&Msg::Control(Command::Disconnect)).await?;
    Ok(report)
}

/// Receives the worker's band, one row per message.
async fn recv_band<R>(spec: &WorkerSpec, rx: &mut FrameReceiver<R>) -> Result<Partition>
where
    R: AsyncRead + Unpin,
{
    let mut rx_buf: Vec<u32> = Vec::new();
    let mut cells = Vec::with_capacity(spec.rows * spec.width);

    for step in 0..spec.rows {
        match rx.recv_into(&mut rx_buf).await? {
            Msg::Data(Payload::Row(row)) if row.len() == spec.width => {
                cells.extend_from_slice(row);
            }
            Msg::Data(Payload::Row(row)) => {
                return Err(WorkerErr::RowLengthMismatch {
                    step,
                    got: row.len(),
                    expected: spec.width,
                });
            }
            Msg::Err(detail) => return Err(WorkerErr::Remote(detail.into_owned())),
            other => {
                return Err(WorkerErr::UnexpectedMessage {
                    step,
                    got: other.kind(),
                });
            }
        }
    }

    Partition::new(spec.width, cells)
}
