use std::io;

/// Reads a message from the body of a received frame.
pub trait Deserialize<'a>: Sized {
    /// Deserializes an instance of `Self` borrowing from `buf` where possible.
    fn deserialize(buf: &'a mut [u8]) -> io::Result<Self>;
}
