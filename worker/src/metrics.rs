use std::time::Duration;

#[derive(Debug, Default, Clone)]
pub struct WorkerMetrics {
    pub exchange_time: Duration,
    pub update_time: Duration,

    pub steps: u64,
    pub flips: u64,
}

impl WorkerMetrics {
    #[inline]
    pub fn bump_step(&mut self) {
        self.steps += 1;
    }

    #[inline]
    pub fn bump_flip(&mut self) {
        self.flips += 1;
    }

    /// The percentage of steps that flipped a spin.
    pub fn flip_percentage(&self) -> f64 {
        if self.steps == 0 {
            return 0.;
        }

        self.flips as f64 * 100. / self.steps as f64
    }
}
