//! Length prefixed framing shared by the orchestrator and the workers.
//!
//! Every frame is a big endian `u64` body length followed by the body. Rows travel
//! as raw native `i32`s and are viewed in place on the receiving end.

mod align;
mod deserialize;
pub mod msg;
mod receiver;
mod sender;
mod serialize;
pub mod specs;

use tokio::io::{AsyncRead, AsyncWrite};

pub use align::Align4;
pub use deserialize::Deserialize;
pub use receiver::FrameReceiver;
pub use sender::FrameSender;
pub use serialize::Serialize;

type LenType = u64;
const LEN_TYPE_SIZE: usize = size_of::<LenType>();

/// Wraps a reader and a writer into both ends of a framed channel.
///
/// # Arguments
/// * `rx` - An async readable, usually the read half of a stream.
/// * `tx` - An async writable, usually the write half of the same stream.
pub fn channel<R, W>(rx: R, tx: W) -> (FrameReceiver<R>, FrameSender<W>)
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    (FrameReceiver::new(rx), FrameSender::new(tx))
}
