//! Run parameters shared by every worker and the per-worker random stream.

use rand::{SeedableRng, rngs::StdRng};

use crate::{Result, WorkerErr};

/// Mixes the rank into the base seed so neighbouring workers get unrelated streams.
const RANK_SEED_STRIDE: u64 = 0x9E37_79B9_7F4A_7C15;

/// The coefficients of the energy function.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RunParams {
    beta: f64,
    pi: f64,
    gamma: f64,
}

impl RunParams {
    /// Creates a new `RunParams`, deriving the external field coefficient from the noise prior.
    ///
    /// # Arguments
    /// * `beta` - The coupling strength between neighbouring spins.
    /// * `pi` - The prior probability of a pixel having been flipped by noise.
    ///
    /// # Returns
    /// An error if `pi` is not inside (0, 1) or `beta` is not finite.
    pub fn new(beta: f64, pi: f64) -> Result<Self> {
        if !(pi > 0. && pi < 1.) {
            return Err(WorkerErr::InvalidParams(format!(
                "the noise prior must be inside (0, 1), got {pi}"
            )));
        }

        if !beta.is_finite() {
            return Err(WorkerErr::InvalidParams(format!(
                "the coupling strength must be finite, got {beta}"
            )));
        }

        let gamma = 0.5 * ((1. - pi) / pi).log2();
        Ok(Self { beta, pi, gamma })
    }

    pub fn beta(&self) -> f64 {
        self.beta
    }

    pub fn pi(&self) -> f64 {
        self.pi
    }

    /// The external field coefficient, `½·log2((1 − π) / π)`.
    pub fn gamma(&self) -> f64 {
        self.gamma
    }
}

/// The amount of iterations each of `workers` workers runs out of a `total` budget.
pub fn iteration_share(total: usize, workers: usize) -> usize {
    total.checked_div(workers).unwrap_or(0)
}

/// Creates the random stream of the worker at `rank`.
///
/// The stream is seeded once, from `seed` and the rank, so two runs with the same seed
/// replay the same draws. Without a seed the stream is seeded from the OS.
pub fn worker_rng(seed: Option<u64>, rank: usize) -> StdRng {
    match seed {
        Some(seed) => StdRng::seed_from_u64(seed ^ (rank as u64).wrapping_mul(RANK_SEED_STRIDE)),
        None => StdRng::from_os_rng(),
    }
}
