//! Where a worker sits in the chain of bands and the links to its neighbours.

use crate::{Result, WorkerErr};

/// The place of a worker's band inside the image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    /// The only worker, both edges are the image's edges.
    Single,
    Top,
    Middle,
    Bottom,
}

/// The immutable identity of a worker inside the chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Position {
    rank: usize,
    workers: usize,
}

impl Position {
    /// Creates a new `Position`.
    ///
    /// # Arguments
    /// * `rank` - The 1-based rank of the worker, 1 owns the topmost band.
    /// * `workers` - The amount of workers in the chain.
    ///
    /// # Returns
    /// An error if `rank` is not inside `1..=workers`.
    pub fn new(rank: usize, workers: usize) -> Result<Self> {
        if rank == 0 || rank > workers {
            return Err(WorkerErr::TopologyMismatch {
                rank,
                workers,
                detail: "rank out of range",
            });
        }

        Ok(Self { rank, workers })
    }

    pub fn rank(&self) -> usize {
        self.rank
    }

    pub fn workers(&self) -> usize {
        self.workers
    }

    /// Whether this band's first row is the image's first row.
    #[inline]
    pub fn is_top(&self) -> bool {
        self.rank == 1
    }

    /// Whether this band's last row is the image's last row.
    #[inline]
    pub fn is_bottom(&self) -> bool {
        self.rank == self.workers
    }

    pub fn role(&self) -> Role {
        match (self.is_top(), self.is_bottom()) {
            (true, true) => Role::Single,
            (true, false) => Role::Top,
            (false, false) => Role::Middle,
            (false, true) => Role::Bottom,
        }
    }
}

/// A worker's position together with the links to the neighbours it exchanges halos with.
pub struct Topology<L> {
    position: Position,
    pub(crate) above: Option<L>,
    pub(crate) below: Option<L>,
}

impl<L> Topology<L> {
    /// Creates a new `Topology`.
    ///
    /// # Arguments
    /// * `position` - The worker's position in the chain.
    /// * `above` - The link to the neighbour above, must be present unless top.
    /// * `below` - The link to the neighbour below, must be present unless bottom.
    ///
    /// # Returns
    /// An error if the given links don't match the position.
    pub fn new(position: Position, above: Option<L>, below: Option<L>) -> Result<Self> {
        let mismatch = |detail: &'static str| WorkerErr::TopologyMismatch {
            rank: position.rank,
            workers: position.workers,
            detail,
        };

        match (position.is_top(), above.is_some()) {
            (true, true) => return Err(mismatch("the top worker can't have a neighbour above")),
            (false, false) => return Err(mismatch("missing the link to the neighbour above")),
            _ => {}
        }

        match (position.is_bottom(), below.is_some()) {
            (true, true) => return Err(mismatch("the bottom worker can't have a neighbour below")),
            (false, false) => return Err(mismatch("missing the link to the neighbour below")),
            _ => {}
        }

        Ok(Self {
            position,
            above,
            below,
        })
    }

    pub fn position(&self) -> Position {
        self.position
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn roles_follow_the_rank() {
        let roles: Vec<_> = (1..=3)
            .map(|rank| Position::new(rank, 3).unwrap().role())
            .collect();

        assert_eq!(roles, [Role::Top, Role::Middle, Role::Bottom]);
        assert_eq!(Position::new(1, 1).unwrap().role(), Role::Single);
    }

    #[test]
    fn rejects_out_of_range_ranks() {
        assert!(Position::new(0, 3).is_err());
        assert!(Position::new(4, 3).is_err());
    }

    #[test]
    fn links_must_match_the_position() {
        let top = Position::new(1, 2).unwrap();
        let bottom = Position::new(2, 2).unwrap();

        assert!(Topology::new(top, None, Some(())).is_ok());
        assert!(Topology::new(top, Some(()), Some(())).is_err());
        assert!(Topology::<()>::new(top, None, None).is_err());
        assert!(Topology::new(bottom, Some(()), None).is_ok());
        assert!(Topology::new(bottom, Some(()), Some(())).is_err());
    }
}
