//! The receiving end of the framed protocol.

use std::io;

use tokio::io::{AsyncRead, AsyncReadExt};

use crate::{Align4, Deserialize, LEN_TYPE_SIZE, LenType};

/// Frames larger than this are rejected before allocating, a 4096 wide row is 16KiB.
const MAX_FRAME_LEN: usize = 64 << 20;

/// Reads length prefixed frames out of `R`.
pub struct FrameReceiver<R: AsyncRead + Unpin> {
    rx: R,
}

impl<R: AsyncRead + Unpin> FrameReceiver<R> {
    pub(super) fn new(rx: R) -> Self {
        Self { rx }
    }

    /// Waits for the next frame and deserializes it.
    ///
    /// # Arguments
    /// * `buf` - The buffer the frame body is read into, the returned
    ///           `T`'s lifetimes will be tied to this buffer. Its word type keeps
    ///           the rows inside the frame aligned for viewing them as `i32`s.
    ///
    /// # Returns
    /// The received message, or an error if the stream ended or the frame is malformed.
    pub async fn recv_into<'buf, T, B>(&mut self, buf: &'buf mut Vec<B>) -> io::Result<T>
    where
        T: Deserialize<'buf>,
        B: Align4,
    {
        let len = self.read_len().await?;

        buf.clear();
        buf.resize(len.div_ceil(size_of::<B>()), B::zeroed());

        let body = &mut bytemuck::cast_slice_mut::<B, u8>(buf)[..len];
        self.rx.read_exact(body).await?;

        T::deserialize(body)
    }

    async fn read_len(&mut self) -> io::Result<usize> {
        let mut prefix = [0; LEN_TYPE_SIZE];
        self.rx.read_exact(&mut prefix).await?;

        let len = LenType::from_be_bytes(prefix) as usize;
        if len > MAX_FRAME_LEN {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                format!("frame of {len} bytes exceeds the {MAX_FRAME_LEN} bytes limit"),
            ));
        }

        Ok(len)
    }
}
