use comms::{
    FrameReceiver, FrameSender,
    msg::{Direction, Msg, Payload},
};
use log::trace;
use tokio::io::{AsyncRead, AsyncWrite};

use super::HaloLink;
use crate::{Result, WorkerErr};

/// A halo link over a framed byte stream, usually a tcp connection between two workers.
///
/// Each direction of the stream carries one of the logical channels, the tag travels
/// inside every frame so a row can't be consumed from the wrong channel.
pub struct NetLink<R, W>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    rx: FrameReceiver<R>,
    tx: FrameSender<W>,
    rx_buf: Vec<u32>,
    received: usize,
}

impl<R, W> NetLink<R, W>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    /// Creates a new `NetLink`.
    ///
    /// # Arguments
    /// * `rx` - The receiving end of the communication.
    /// * `tx` - The sending end of the communication.
    pub fn new(rx: FrameReceiver<R>, tx: FrameSender<W>) -> Self {
        Self {
            rx,
            tx,
            rx_buf: Vec::new(),
            received: 0,
        }
    }
}

impl<R, W> HaloLink for NetLink<R, W>
where
    R: AsyncRead + Unpin + Send,
    W: AsyncWrite + Unpin + Send,
{
    async fn send_row(&mut self, direction: Direction, row: &[i32]) -> Result<()> {
        let msg = Msg::Data(Payload::Halo(direction, row));
        self.tx.send(&msg).await?;
        Ok(())
    }

    async fn recv_row(&mut self, direction: Direction, row: &mut [i32]) -> Result<()> {
        let step = self.received;

        match self.rx.recv_into(&mut self.rx_buf).await? {
            Msg::Data(Payload::Halo(tag, halo)) if tag == direction => {
                if halo.len() != row.len() {
                    return Err(WorkerErr::RowLengthMismatch {
                        step,
                        got: halo.len(),
                        expected: row.len(),
                    });
                }

                row.copy_from_slice(halo);
            }
            Msg::Err(detail) => return Err(WorkerErr::Remote(detail.into_owned())),
            other => {
                return Err(WorkerErr::UnexpectedMessage {
                    step,
                    got: other.kind(),
                });
            }
        }

        trace!(step = step; "received {direction:?} halo");
        self.received += 1;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use tokio::io;

    use super::*;

    fn pair() -> (
        NetLink<io::ReadHalf<io::DuplexStream>, io::WriteHalf<io::DuplexStream>>,
        NetLink<io::ReadHalf<io::DuplexStream>, io::WriteHalf<io::DuplexStream>>,
    ) {
        let (one, two) = io::duplex(4096);

        let (rx, tx) = io::split(one);
        let (rx, tx) = comms::channel(rx, tx);
        let upper = NetLink::new(rx, tx);

        let (rx, tx) = io::split(two);
        let (rx, tx) = comms::channel(rx, tx);
        let lower = NetLink::new(rx, tx);

        (upper, lower)
    }

    #[tokio::test]
    async fn rows_keep_their_channel() {
        let (mut upper, mut lower) = pair();

        lower.send_row(Direction::Upward, &[1, -1, 1]).await.unwrap();
        upper.send_row(Direction::Downward, &[-1, -1, 1]).await.unwrap();

        let mut bottom = [0; 3];
        upper.recv_row(Direction::Upward, &mut bottom).await.unwrap();
        assert_eq!(bottom, [1, -1, 1]);

        let mut top = [0; 3];
        lower.recv_row(Direction::Downward, &mut top).await.unwrap();
        assert_eq!(top, [-1, -1, 1]);
    }

    #[tokio::test]
    async fn rejects_a_row_from_the_wrong_channel() {
        let (mut upper, mut lower) = pair();

        lower.send_row(Direction::Downward, &[1, 1, 1]).await.unwrap();

        let mut bottom = [0; 3];
        let err = upper
            .recv_row(Direction::Upward, &mut bottom)
            .await
            .unwrap_err();

        assert!(matches!(err, WorkerErr::UnexpectedMessage { step: 0, .. }));
    }

    #[tokio::test]
    async fn rejects_rows_of_another_width() {
        let (mut upper, mut lower) = pair();

        lower.send_row(Direction::Upward, &[1, 1]).await.unwrap();

        let mut bottom = [0; 3];
        let err = upper
            .recv_row(Direction::Upward, &mut bottom)
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            WorkerErr::RowLengthMismatch {
                got: 2,
                expected: 3,
                ..
            }
        ));
    }
}
