use comms::msg::Direction;

use crate::Result;

/// A point to point link with an adjacent worker, carrying one logical channel per direction.
///
/// Both calls block until the row has been handed over, how long that takes depends
/// on the link: a rendezvous link waits for the peer, a buffered one only for its buffer.
#[allow(unused)]
#[trait_variant::make(HaloLink: Send)]
pub trait LocalHaloLink {
    /// Sends `row` on the `direction` channel.
    ///
    /// # Arguments
    /// * `direction` - The channel tag.
    /// * `row` - The boundary row to hand over.
    async fn send_row(&mut self, direction: Direction, row: &[i32]) -> Result<()>;

    /// Receives the next row of the `direction` channel into `row`.
    ///
    /// # Arguments
    /// * `direction` - The channel tag the row must arrive with.
    /// * `row` - The halo buffer to overwrite, its length must match the received row.
    ///
    /// # Returns
    /// An error if the link is closed, the tag doesn't match or the length differs.
    async fn recv_row(&mut self, direction: Direction, row: &mut [i32]) -> Result<()>;
}
