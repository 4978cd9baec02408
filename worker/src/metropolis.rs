//! The single cell update rule of the sampler.

use rand::Rng;

use crate::{Partition, RunParams, halo::HaloRows, topology::Position};

/// A candidate cell along with the uniform draw that decides whether it flips.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Proposal {
    pub y: usize,
    pub x: usize,
    /// Uniform in [0, 1).
    pub threshold: f64,
}

/// The source of the sampler's proposals.
pub trait Proposer {
    /// Proposes a cell of a band of `rows` by `width`.
    fn propose(&mut self, rows: usize, width: usize) -> Proposal;
}

/// Draws proposals from a random number generator.
pub struct RandomProposer<R: Rng> {
    rng: R,
}

impl<R: Rng> RandomProposer<R> {
    pub fn new(rng: R) -> Self {
        Self { rng }
    }
}

impl<R: Rng> Proposer for RandomProposer<R> {
    fn propose(&mut self, rows: usize, width: usize) -> Proposal {
        let y = self.rng.random_range(0..rows);
        let x = self.rng.random_range(0..width);
        let threshold = self.rng.random();

        Proposal { y, x, threshold }
    }
}

/// Resolves the eight neighbours of cell (`y`, `x`), clockwise from the top left:
/// NW, N, NE, E, SE, S, SW, W.
///
/// Rows beyond the band come from the halo rows, unless the band's edge is the image's
/// edge. Cells outside the image count as zero.
pub fn neighbours(
    partition: &Partition,
    halo: &HaloRows,
    position: Position,
    y: usize,
    x: usize,
) -> [i32; 8] {
    let at_top = y == 0;
    let at_bottom = y == partition.rows() - 1;

    let north = match (at_top, position.is_top()) {
        (true, true) => None,
        (true, false) => halo.top(),
        (false, _) => Some(partition.row(y - 1)),
    };

    let south = match (at_bottom, position.is_bottom()) {
        (true, true) => None,
        (true, false) => halo.bottom(),
        (false, _) => Some(partition.row(y + 1)),
    };

    let [nw, n, ne] = triple(north, x);
    let [sw, s, se] = triple(south, x);
    let [w, _, e] = triple(Some(partition.row(y)), x);

    [nw, n, ne, e, se, s, sw, w]
}

/// The cells at `x - 1`, `x` and `x + 1` of `row`, zero where out of range.
fn triple(row: Option<&[i32]>, x: usize) -> [i32; 3] {
    let Some(row) = row else {
        return [0; 3];
    };

    let at = |i: Option<usize>| i.and_then(|i| row.get(i)).copied().unwrap_or(0);
    [at(x.checked_sub(1)), at(Some(x)), at(x.checked_add(1))]
}

/// Sum of the eight neighbours of cell (`y`, `x`).
pub fn neighbour_sum(
    partition: &Partition,
    halo: &HaloRows,
    position: Position,
    y: usize,
    x: usize,
) -> i32 {
    neighbours(partition, halo, position, y, x).iter().sum()
}

/// The Metropolis update rule for the denoising energy.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Metropolis {
    gamma: f64,
    beta: f64,
}

impl Metropolis {
    pub fn new(params: &RunParams) -> Self {
        Self {
            gamma: params.gamma(),
            beta: params.beta(),
        }
    }

    /// The probability of flipping a cell.
    ///
    /// `min(1, exp(−2γ·spin·original − 2β·spin·neighbour_sum))`, kept strictly positive
    /// so it stays inside (0, 1] even when the exponential underflows.
    ///
    /// # Arguments
    /// * `spin` - The cell's current spin.
    /// * `original` - The cell's observed spin.
    /// * `neighbour_sum` - The sum of the cell's eight neighbours.
    pub fn acceptance(&self, spin: i32, original: i32, neighbour_sum: i32) -> f64 {
        let spin = f64::from(spin);
        let data = -2. * self.gamma * spin * f64::from(original);
        let smoothness = -2. * self.beta * spin * f64::from(neighbour_sum);

        (data + smoothness).exp().clamp(f64::MIN_POSITIVE, 1.)
    }

    /// Runs one update of the proposed cell.
    ///
    /// # Arguments
    /// * `partition` - The band to update.
    /// * `halo` - The latest rows of the neighbouring bands.
    /// * `position` - The band's position in the image.
    /// * `proposal` - The cell to update and the draw deciding the flip.
    ///
    /// # Returns
    /// Whether the cell flipped.
    pub fn step(
        &self,
        partition: &mut Partition,
        halo: &HaloRows,
        position: Position,
        proposal: Proposal,
    ) -> bool {
        let Proposal { y, x, threshold } = proposal;

        let sum = neighbour_sum(partition, halo, position, y, x);
        let score = self.acceptance(partition.spin(y, x), partition.original(y, x), sum);

        let flip = threshold < score;
        if flip {
            partition.flip(y, x);
        }

        flip
    }
}

#[cfg(test)]
mod tests {
    use rand::{SeedableRng, rngs::StdRng};

    use super::*;

    fn engine(beta: f64, pi: f64) -> Metropolis {
        Metropolis::new(&RunParams::new(beta, pi).unwrap())
    }

    fn at(y: usize, x: usize, threshold: f64) -> Proposal {
        Proposal { y, x, threshold }
    }

    #[test]
    fn isolated_cell_follows_the_data_term() {
        // Top worker of two, band of 2 by 4 with a lone +1 at (0, 0).
        let position = Position::new(1, 2).unwrap();
        let halo = HaloRows::new(false, true, 4);
        let metropolis = engine(0.4, 0.2);

        let mut partition = Partition::new(4, vec![1, 0, 0, 0, 0, 0, 0, 0]).unwrap();
        assert_eq!(neighbour_sum(&partition, &halo, position, 0, 0), 0);

        let score = metropolis.acceptance(1, 1, 0);
        assert!((score - (-2f64).exp()).abs() < 1e-12);

        assert!(!metropolis.step(&mut partition, &halo, position, at(0, 0, 0.5)));
        assert_eq!(partition.spin(0, 0), 1);

        assert!(metropolis.step(&mut partition, &halo, position, at(0, 0, 0.1)));
        assert_eq!(partition.spin(0, 0), -1);
    }

    #[test]
    fn global_top_ignores_the_top_halo() {
        let position = Position::new(1, 2).unwrap();
        let halo = HaloRows::from_rows(Some(vec![1, 1, 1]), Some(vec![0, 0, 0]));
        let partition = Partition::new(3, vec![-1, -1, -1, -1, -1, -1]).unwrap();

        let [nw, n, ne, ..] = neighbours(&partition, &halo, position, 0, 1);
        assert_eq!([nw, n, ne], [0, 0, 0]);
    }

    #[test]
    fn inner_edges_read_the_halo() {
        // Middle worker: rows above and below come from the neighbours.
        let position = Position::new(2, 3).unwrap();
        let halo = HaloRows::from_rows(Some(vec![1, 2, 3]), Some(vec![10, 20, 30]));
        let partition = Partition::new(3, vec![4, 5, 6]).unwrap();

        assert_eq!(
            neighbours(&partition, &halo, position, 0, 1),
            [1, 2, 3, 6, 30, 20, 10, 4]
        );
        assert_eq!(
            neighbours(&partition, &halo, position, 0, 0),
            [0, 1, 2, 5, 20, 10, 0, 0]
        );
        assert_eq!(
            neighbours(&partition, &halo, position, 0, 2),
            [2, 3, 0, 0, 0, 30, 20, 5]
        );
    }

    #[test]
    fn inside_the_band_reads_the_band() {
        let position = Position::new(2, 3).unwrap();
        let halo = HaloRows::from_rows(Some(vec![100; 3]), Some(vec![100; 3]));
        let partition = Partition::new(3, (1..=9).collect()).unwrap();

        assert_eq!(
            neighbours(&partition, &halo, position, 1, 1),
            [1, 2, 3, 6, 9, 8, 7, 4]
        );
    }

    #[test]
    fn global_bottom_ignores_the_bottom_halo() {
        let position = Position::new(3, 3).unwrap();
        let halo = HaloRows::from_rows(Some(vec![1, 1]), Some(vec![1, 1]));
        let partition = Partition::new(2, vec![-1, -1]).unwrap();

        assert_eq!(
            neighbours(&partition, &halo, position, 0, 0),
            [0, 1, 1, -1, 0, 0, 0, 0]
        );
    }

    #[test]
    fn acceptance_stays_in_the_unit_interval() {
        let metropolis = engine(3.5, 1e-300);

        for spin in [-1, 1] {
            for original in [-1, 1] {
                for sum in -8..=8 {
                    let score = metropolis.acceptance(spin, original, sum);
                    assert!(score > 0. && score <= 1., "score = {score}");
                }
            }
        }
    }

    #[test]
    fn spins_stay_binary() {
        let position = Position::new(1, 1).unwrap();
        let halo = HaloRows::default();
        let metropolis = engine(0.4, 0.2);
        let mut proposer = RandomProposer::new(StdRng::seed_from_u64(3));

        let cells = (0..64).map(|i| if i % 3 == 0 { 1 } else { -1 }).collect();
        let mut partition = Partition::new(8, cells).unwrap();

        for _ in 0..10_000 {
            let proposal = proposer.propose(partition.rows(), partition.width());
            metropolis.step(&mut partition, &halo, position, proposal);
        }

        assert!(partition.iter_rows().flatten().all(|&s| s == 1 || s == -1));
    }

    #[test]
    fn seeded_runs_replay_exactly() {
        let run = || {
            let position = Position::new(1, 1).unwrap();
            let halo = HaloRows::default();
            let metropolis = engine(0.4, 0.2);
            let mut proposer = RandomProposer::new(StdRng::seed_from_u64(11));

            let cells = (0..36).map(|i| if i % 2 == 0 { 1 } else { -1 }).collect();
            let mut partition = Partition::new(6, cells).unwrap();

            let flips: Vec<bool> = (0..2_000)
                .map(|_| {
                    let proposal = proposer.propose(6, 6);
                    metropolis.step(&mut partition, &halo, position, proposal)
                })
                .collect();

            (flips, partition)
        };

        assert_eq!(run(), run());
    }

    #[test]
    fn proposals_stay_inside_the_band() {
        let mut proposer = RandomProposer::new(StdRng::seed_from_u64(5));

        for _ in 0..1_000 {
            let Proposal { y, x, threshold } = proposer.propose(3, 7);
            assert!(y < 3 && x < 7);
            assert!((0. ..1.).contains(&threshold));
        }
    }
}
