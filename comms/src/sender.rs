//! The sending end of the framed protocol.

use std::io;

use tokio::io::{AsyncWrite, AsyncWriteExt};

use crate::{
    LEN_TYPE_SIZE, LenType, Serialize,
    msg::{Msg, Payload},
};

/// Writes length prefixed frames into `W`.
pub struct FrameSender<W>
where
    W: AsyncWrite + Unpin,
{
    tx: W,
    frame: Vec<u8>,
}

impl<W: AsyncWrite + Unpin> FrameSender<W> {
    pub(super) fn new(tx: W) -> Self {
        Self {
            tx,
            frame: Vec::new(),
        }
    }

    /// Sends `msg` as a single frame and flushes the writer.
    ///
    /// # Arguments
    /// * `msg` - A serializable object.
    ///
    /// # Returns
    /// A result object that returns `io::Error` on failure.
    pub async fn send<'a, T: Serialize<'a>>(&mut self, msg: &'a T) -> io::Result<()> {
        self.write_frame(msg).await?;
        self.tx.flush().await
    }

    /// Sends each of `rows` in its own `Row` frame, flushing once after the last one.
    ///
    /// # Returns
    /// The amount of rows sent.
    pub async fn send_rows<'a, I>(&mut self, rows: I) -> io::Result<usize>
    where
        I: IntoIterator<Item = &'a [i32]>,
    {
        let mut sent = 0;
        for row in rows {
            self.write_frame(&Msg::Data(Payload::Row(row))).await?;
            sent += 1;
        }

        self.tx.flush().await?;
        Ok(sent)
    }

    /// Writes the frame of `msg` without flushing.
    ///
    /// The bytes returned by `serialize` are written after the prefix and header
    /// straight from `msg`, never copied into the frame buffer.
    async fn write_frame<'a, T: Serialize<'a>>(&mut self, msg: &'a T) -> io::Result<()> {
        let Self { tx, frame } = self;

        frame.clear();
        frame.extend_from_slice(&[0; LEN_TYPE_SIZE]);

        let tail = msg.serialize(frame);
        let body_len = frame.len() - LEN_TYPE_SIZE + tail.map_or(0, <[u8]>::len);
        frame[..LEN_TYPE_SIZE].copy_from_slice(&(body_len as LenType).to_be_bytes());

        tx.write_all(frame).await?;
        match tail {
            Some(tail) => tx.write_all(tail).await,
            None => Ok(()),
        }
    }
}
