use std::net::SocketAddr;

use serde::{Deserialize, Serialize};

/// Wire-level bootstrap specification for a worker instance.
///
/// This type is exchanged over the network during worker bootstrap, it carries
/// everything a worker needs to own its band of the image.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkerSpec {
    /// The 1-based position of the worker in the chain, 1 owns the topmost band.
    pub rank: usize,
    pub workers: usize,
    pub width: usize,
    /// The amount of rows in the worker's band.
    pub rows: usize,
    /// This worker's share of the total iteration budget.
    pub iterations: usize,
    pub beta: f64,
    pub pi: f64,
    pub seed: Option<u64>,
    /// Where the neighbour below listens, `None` for the bottom worker or when
    /// the links are set up in-process.
    pub below: Option<SocketAddr>,
}

/// The summary a worker sends back once its band has been gathered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkerReport {
    pub rank: usize,
    pub iterations: usize,
    pub flips: u64,
}

impl WorkerReport {
    /// The percentage of iterations that ended up flipping a spin.
    pub fn flip_percentage(&self) -> f64 {
        if self.iterations == 0 {
            return 0.;
        }

        self.flips as f64 * 100. / self.iterations as f64
    }
}
