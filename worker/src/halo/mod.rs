//! Boundary row exchange between adjacent bands.

mod link;
mod net;
mod rendezvous;

use comms::msg::Direction;

pub use link::HaloLink;
pub use net::NetLink;
pub use rendezvous::{RendezvousLink, rendezvous};

use crate::{Partition, Result, topology::Topology};

/// The latest boundary rows received from the neighbours above and below.
///
/// A missing row stands for the image's edge, its cells count as zero.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HaloRows {
    top: Option<Vec<i32>>,
    bottom: Option<Vec<i32>>,
}

impl HaloRows {
    /// Creates the halo buffers for a worker, zeroed until the first exchange.
    ///
    /// # Arguments
    /// * `has_above` - Whether there's a neighbour above.
    /// * `has_below` - Whether there's a neighbour below.
    /// * `width` - The width of the image.
    pub fn new(has_above: bool, has_below: bool, width: usize) -> Self {
        Self {
            top: has_above.then(|| vec![0; width]),
            bottom: has_below.then(|| vec![0; width]),
        }
    }

    /// Creates the halo buffers from already known rows.
    pub fn from_rows(top: Option<Vec<i32>>, bottom: Option<Vec<i32>>) -> Self {
        Self { top, bottom }
    }

    pub fn top(&self) -> Option<&[i32]> {
        self.top.as_deref()
    }

    pub fn bottom(&self) -> Option<&[i32]> {
        self.bottom.as_deref()
    }
}

/// Refreshes both halo rows with the neighbours' current boundary rows.
///
/// The order of the four steps lets a chain of workers progress even if every send
/// blocks until its matching receive:
/// 1. first row goes up.
/// 2. the neighbour below's first row comes in.
/// 3. last row goes down.
/// 4. the neighbour above's last row comes in.
///
/// The top worker starts by receiving and the bottom worker by sending, so in each
/// direction the rows ripple along the chain instead of every worker waiting on a receive.
///
/// # Arguments
/// * `topology` - The worker's position and neighbour links.
/// * `partition` - The worker's band, whose edge rows are sent.
/// * `halo` - The halo buffers to overwrite.
///
/// # Returns
/// An error if any of the links fails.
pub async fn exchange<L: HaloLink>(
    topology: &mut Topology<L>,
    partition: &Partition,
    halo: &mut HaloRows,
) -> Result<()> {
    let width = partition.width();

    if let Some(above) = topology.above.as_mut() {
        above
            .send_row(Direction::Upward, partition.first_row())
            .await?;
    }

    if let Some(below) = topology.below.as_mut() {
        let bottom = halo.bottom.get_or_insert_with(|| vec![0; width]);
        below.recv_row(Direction::Upward, bottom).await?;

        below
            .send_row(Direction::Downward, partition.last_row())
            .await?;
    }

    if let Some(above) = topology.above.as_mut() {
        let top = halo.top.get_or_insert_with(|| vec![0; width]);
        above.recv_row(Direction::Downward, top).await?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::topology::Position;

    #[tokio::test]
    async fn neighbours_swap_their_edge_rows() {
        let (upper_link, lower_link) = rendezvous();

        let top = Position::new(1, 2).unwrap();
        let bottom = Position::new(2, 2).unwrap();
        let mut upper = Topology::new(top, None, Some(upper_link)).unwrap();
        let mut lower = Topology::new(bottom, Some(lower_link), None).unwrap();

        let upper_band = Partition::new(2, vec![1, 1, -1, 1]).unwrap();
        let lower_band = Partition::new(2, vec![1, -1, -1, -1]).unwrap();

        let mut upper_halo = HaloRows::new(false, true, 2);
        let mut lower_halo = HaloRows::new(true, false, 2);

        let (a, b) = tokio::join!(
            exchange(&mut upper, &upper_band, &mut upper_halo),
            exchange(&mut lower, &lower_band, &mut lower_halo),
        );
        a.unwrap();
        b.unwrap();

        assert_eq!(upper_halo.top(), None);
        assert_eq!(upper_halo.bottom(), Some(&[1, -1][..]));
        assert_eq!(lower_halo.top(), Some(&[-1, 1][..]));
        assert_eq!(lower_halo.bottom(), None);
    }

    #[tokio::test]
    async fn a_lone_worker_exchanges_nothing() {
        let mut single =
            Topology::<RendezvousLink>::new(Position::new(1, 1).unwrap(), None, None).unwrap();
        let band = Partition::new(2, vec![1, -1]).unwrap();
        let mut halo = HaloRows::new(false, false, 2);

        exchange(&mut single, &band, &mut halo).await.unwrap();
        assert_eq!(halo, HaloRows::default());
    }
}
