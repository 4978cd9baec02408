use comms::msg::Direction;
use tokio::sync::{mpsc, oneshot};

use super::HaloLink;
use crate::{Result, WorkerErr};

/// A row in flight, the sender stays blocked until `ack` fires.
struct Envelope {
    direction: Direction,
    row: Vec<i32>,
    ack: oneshot::Sender<()>,
}

/// An in-process halo link with rendezvous semantics, a send only completes once the
/// peer has received the row.
pub struct RendezvousLink {
    tx: mpsc::Sender<Envelope>,
    rx: mpsc::Receiver<Envelope>,
    sent: usize,
    received: usize,
}

/// Creates both ends of a rendezvous link between two adjacent workers.
///
/// # Returns
/// The end for the upper worker and the end for the lower worker.
pub fn rendezvous() -> (RendezvousLink, RendezvousLink) {
    let (upper_tx, lower_rx) = mpsc::channel(1);
    let (lower_tx, upper_rx) = mpsc::channel(1);

    (
        RendezvousLink::new(upper_tx, upper_rx),
        RendezvousLink::new(lower_tx, lower_rx),
    )
}

impl RendezvousLink {
    fn new(tx: mpsc::Sender<Envelope>, rx: mpsc::Receiver<Envelope>) -> Self {
        Self {
            tx,
            rx,
            sent: 0,
            received: 0,
        }
    }
}

impl HaloLink for RendezvousLink {
    async fn send_row(&mut self, direction: Direction, row: &[i32]) -> Result<()> {
        let step = self.sent;
        let (ack, acked) = oneshot::channel();

        let envelope = Envelope {
            direction,
            row: row.to_vec(),
            ack,
        };

        self.tx
            .send(envelope)
            .await
            .map_err(|_| WorkerErr::LinkClosed { step })?;

        acked.await.map_err(|_| WorkerErr::LinkClosed { step })?;
        self.sent += 1;
        Ok(())
    }

    async fn recv_row(&mut self, direction: Direction, row: &mut [i32]) -> Result<()> {
        let step = self.received;

        let Some(envelope) = self.rx.recv().await else {
            return Err(WorkerErr::LinkClosed { step });
        };

        if envelope.direction != direction {
            return Err(WorkerErr::UnexpectedMessage {
                step,
                got: match envelope.direction {
                    Direction::Upward => "data/halo_upward",
                    Direction::Downward => "data/halo_downward",
                },
            });
        }

        if envelope.row.len() != row.len() {
            return Err(WorkerErr::RowLengthMismatch {
                step,
                got: envelope.row.len(),
                expected: row.len(),
            });
        }

        row.copy_from_slice(&envelope.row);
        let _ = envelope.ack.send(());
        self.received += 1;
        Ok(())
    }
}
