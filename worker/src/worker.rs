use std::time::Instant;

use log::{debug, info};

use crate::{
    Partition, Result,
    halo::{self, HaloLink, HaloRows},
    metrics::WorkerMetrics,
    metropolis::{Metropolis, Proposer},
    topology::Topology,
};

/// Sampler runtime for a single band of the image.
pub struct Worker<L, P> {
    topology: Topology<L>,
    partition: Partition,
    halo: HaloRows,
    engine: Metropolis,
    proposer: P,
    iterations: usize,
}

impl<L, P> Worker<L, P>
where
    L: HaloLink + Send,
    P: Proposer + Send,
{
    /// Creates a new `Worker`.
    ///
    /// # Args
    /// * `topology` - The worker's position and the links to its neighbours.
    /// * `partition` - The band this worker owns.
    /// * `engine` - The update rule.
    /// * `proposer` - The source of the cells to update.
    /// * `iterations` - The amount of exchange and update rounds to run.
    ///
    /// # Returns
    /// A new worker instance.
    pub fn new(
        topology: Topology<L>,
        partition: Partition,
        engine: Metropolis,
        proposer: P,
        iterations: usize,
    ) -> Self {
        let position = topology.position();
        let halo = HaloRows::new(
            !position.is_top(),
            !position.is_bottom(),
            partition.width(),
        );

        Self {
            topology,
            partition,
            halo,
            engine,
            proposer,
            iterations,
        }
    }

    /// Runs every round of halo exchange followed by a single cell update.
    ///
    /// # Returns
    /// The updated band and the run's metrics.
    ///
    /// # Errors
    /// Returns `WorkerErr` if a neighbour link fails.
    pub async fn run(mut self) -> Result<(Partition, WorkerMetrics)> {
        let position = self.topology.position();
        let (rows, width) = (self.partition.rows(), self.partition.width());
        let mut metrics = WorkerMetrics::default();

        info!(
            rank = position.rank(),
            rows = rows,
            iterations = self.iterations;
            "worker starting as {:?}", position.role()
        );

        for step in 0..self.iterations {
            let start = Instant::now();
            halo::exchange(&mut self.topology, &self.partition, &mut self.halo).await?;
            metrics.exchange_time += start.elapsed();

            let start = Instant::now();
            let proposal = self.proposer.propose(rows, width);
            let flipped = self
                .engine
                .step(&mut self.partition, &self.halo, position, proposal);
            metrics.update_time += start.elapsed();

            metrics.bump_step();
            if flipped {
                metrics.bump_flip();
                debug!(
                    rank = position.rank(),
                    step = step;
                    "flipped ({}, {})", proposal.y, proposal.x
                );
            }
        }

        info!(
            rank = position.rank(),
            flips = metrics.flips,
            exchange_ms = metrics.exchange_time.as_millis() as u64;
            "worker finished as {:?}, flipped {:.2}% of {} proposals",
            position.role(),
            metrics.flip_percentage(),
            metrics.steps,
        );

        Ok((self.partition, metrics))
    }
}
