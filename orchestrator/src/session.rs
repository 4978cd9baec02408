use std::{io, net::SocketAddr};

use comms::{
    FrameReceiver, FrameSender,
    msg::{Command, Msg, Payload},
    specs::worker::{WorkerReport, WorkerSpec},
};
use log::{debug, info};
use tokio::{
    io::{AsyncRead, AsyncWrite},
    net::{
        TcpStream,
        tcp::{OwnedReadHalf, OwnedWriteHalf},
    },
};

use crate::{
    decomposition::Band,
    error::{OrchestratorError, Result},
    image::Image,
};

/// The outcome of a run.
#[derive(Debug)]
pub struct Denoised {
    pub image: Image,
    /// One per worker, in band order.
    pub reports: Vec<WorkerReport>,
}

/// The orchestrator's channels to every worker, in band order.
///
/// Drives a run through its phases: bootstrap every worker with its spec, scatter
/// the bands, gather them back and collect the reports.
pub struct Session<R, W>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    workers: Vec<(FrameReceiver<R>, FrameSender<W>)>,
}

impl Session<OwnedReadHalf, OwnedWriteHalf> {
    /// Connects to every worker, in band order.
    ///
    /// # Arguments
    /// * `addrs` - The network addresses of the workers, the first one owns the top band.
    ///
    /// # Returns
    /// A new `Session` or the first connection failure.
    pub async fn connect(addrs: &[SocketAddr]) -> Result<Self> {
        let mut workers = Vec::with_capacity(addrs.len());

        for addr in addrs {
            debug!("connecting to worker at {addr}");
            let stream = TcpStream::connect(addr).await.map_err(|source| {
                OrchestratorError::ConnectionFailed {
                    addr: addr.to_string(),
                    source,
                }
            })?;

            stream.set_nodelay(true)?;
            let (rx, tx) = stream.into_split();
            workers.push(comms::channel(rx, tx));
        }

        info!(workers = workers.len(); "connected to every worker");
        Ok(Self::new(workers))
    }
}

impl<R, W> Session<R, W>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    /// Creates a new `Session` over already open channels.
    pub fn new(workers: Vec<(FrameReceiver<R>, FrameSender<W>)>) -> Self {
        Self { workers }
    }

    /// Runs every phase of the run.
    ///
    /// # Arguments
    /// * `image` - The noisy image.
    /// * `bands` - The band of each worker, in the same order as the channels.
    /// * `specs` - The spec of each worker, in the same order as the channels.
    ///
    /// # Returns
    /// The reassembled image and the workers' reports.
    pub async fn run(
        &mut self,
        image: &Image,
        bands: &[Band],
        specs: Vec<WorkerSpec>,
    ) -> Result<Denoised> {
        if bands.len() != self.workers.len() || specs.len() != self.workers.len() {
            return Err(OrchestratorError::InvalidConfig(format!(
                "{} band(s) and {} spec(s) for {} worker(s)",
                bands.len(),
                specs.len(),
                self.workers.len()
            )));
        }

        self.bootstrap(specs).await?;
        self.scatter(image, bands).await?;
        let denoised = self.gather(bands, image.width()).await?;
        let reports = self.collect_reports().await?;

        Ok(Denoised {
            image: denoised,
            reports,
        })
    }

    /// Sends every worker its spec.
    async fn bootstrap(&mut self, specs: Vec<WorkerSpec>) -> Result<()> {
        for (i, spec) in specs.into_iter().enumerate() {
            debug!(rank = spec.rank, rows = spec.rows; "sending worker spec");

            let (_, tx) = &mut self.workers[i];
            let sent = tx.send(&Msg::Control(Command::CreateWorker(spec))).await;
            if let Err(e) = sent {
                return Err(self.failed_send(i, e).await);
            }
        }

        Ok(())
    }

    /// Sends every band to its worker, one row per message.
    async fn scatter(&mut self, image: &Image, bands: &[Band]) -> Result<()> {
        for (i, band) in bands.iter().enumerate() {
            let (_, tx) = &mut self.workers[i];
            let sent = tx.send_rows(band.rows.clone().map(|y| image.row(y))).await;

            match sent {
                Ok(sent) => debug!(rank = band.rank, rows = sent; "scattered band"),
                Err(e) => return Err(self.failed_send(i, e).await),
            }
        }

        info!("scattered every band");
        Ok(())
    }

    /// The failure behind a send to the worker at index `i` that couldn't be written.
    ///
    /// A worker that fails reports why before closing its channel, so the report is
    /// still waiting to be read.
    async fn failed_send(&mut self, i: usize, e: io::Error) -> OrchestratorError {
        let (rx, _) = &mut self.workers[i];
        let mut rx_buf: Vec<u32> = Vec::new();

        loop {
            match rx.recv_into(&mut rx_buf).await {
                Ok(Msg::Err(detail)) => {
                    return OrchestratorError::WorkerError {
                        rank: i + 1,
                        msg: detail.into_owned(),
                    };
                }
                Ok(msg) => debug!(rank = i + 1; "skipping {} after a failed send", msg.kind()),
                Err(_) => return OrchestratorError::Io(e),
            }
        }
    }

    /// Receives every band back and reassembles the image, top band first.
    async fn gather(&mut self, bands: &[Band], width: usize) -> Result<Image> {
        let mut rx_buf: Vec<u32> = Vec::new();
        let mut cells = Vec::with_capacity(bands.iter().map(Band::len).sum::<usize>() * width);

        for ((rx, _), band) in self.workers.iter_mut().zip(bands) {
            let rank = band.rank;

            for _ in band.rows.clone() {
                match rx.recv_into(&mut rx_buf).await? {
                    Msg::Data(Payload::Row(row)) if row.len() == width => {
                        cells.extend_from_slice(row);
                    }
                    Msg::Data(Payload::Row(row)) => {
                        return Err(OrchestratorError::Protocol {
                            rank,
                            detail: format!("row of {} cells, expected {width}", row.len()),
                        });
                    }
                    Msg::Err(detail) => {
                        return Err(OrchestratorError::WorkerError {
                            rank,
                            msg: detail.into_owned(),
                        });
                    }
                    other => {
                        return Err(OrchestratorError::Protocol {
                            rank,
                            detail: format!("expected a row, got {}", other.kind()),
                        });
                    }
                }
            }

            debug!(rank = rank; "gathered band");
        }

        info!("gathered every band");
        Image::new(width, cells)
    }

    /// Waits for every worker's report and disconnection.
    async fn collect_reports(&mut self) -> Result<Vec<WorkerReport>> {
        let mut rx_buf: Vec<u32> = Vec::new();
        let mut reports = Vec::with_capacity(self.workers.len());

        for (i, (rx, _)) in self.workers.iter_mut().enumerate() {
            let rank = i + 1;

            loop {
                match rx.recv_into(&mut rx_buf).await? {
                    Msg::Control(Command::Report(report)) => reports.push(report),
                    Msg::Control(Command::Disconnect) => break,
                    Msg::Err(detail) => {
                        return Err(OrchestratorError::WorkerError {
                            rank,
                            msg: detail.into_owned(),
                        });
                    }
                    other => {
                        return Err(OrchestratorError::Protocol {
                            rank,
                            detail: format!("expected a report, got {}", other.kind()),
                        });
                    }
                }
            }
        }

        Ok(reports)
    }
}
