use std::{fs, path::PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{OrchestratorError, Result};

const DEFAULT_BETA: f64 = 0.4;
const DEFAULT_PI: f64 = 0.2;
const DEFAULT_ITERATIONS: usize = 5_000_000;

/// Where the workers of a run live.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClusterConfig {
    /// `workers` tasks inside the orchestrator's process.
    Local { workers: usize },
    /// Worker processes listening on `worker_addrs`, in band order.
    Remote { worker_addrs: Vec<String> },
}

impl ClusterConfig {
    /// The amount of workers, which is also the amount of bands.
    pub fn workers(&self) -> usize {
        match self {
            ClusterConfig::Local { workers } => *workers,
            ClusterConfig::Remote { worker_addrs } => worker_addrs.len(),
        }
    }
}

/// Everything a denoising run needs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunConfig {
    pub input: PathBuf,
    pub output: PathBuf,
    #[serde(default = "default_beta")]
    pub beta: f64,
    #[serde(default = "default_pi")]
    pub pi: f64,
    /// The total budget, split evenly among the workers.
    #[serde(default = "default_iterations")]
    pub iterations: usize,
    #[serde(default)]
    pub seed: Option<u64>,
    pub cluster: ClusterConfig,
}

fn default_beta() -> f64 {
    DEFAULT_BETA
}

fn default_pi() -> f64 {
    DEFAULT_PI
}

fn default_iterations() -> usize {
    DEFAULT_ITERATIONS
}

impl RunConfig {
    /// A config with the default coefficients.
    pub fn new(
        input: impl Into<PathBuf>,
        output: impl Into<PathBuf>,
        cluster: ClusterConfig,
    ) -> Self {
        Self {
            input: input.into(),
            output: output.into(),
            beta: DEFAULT_BETA,
            pi: DEFAULT_PI,
            iterations: DEFAULT_ITERATIONS,
            seed: None,
            cluster,
        }
    }

    /// Loads a `RunConfig` from a JSON file.
    pub fn load(path: &str) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            OrchestratorError::InvalidConfig(format!("cannot read '{path}': {e}"))
        })?;

        Self::from_json(&content)
    }

    pub fn from_json(content: &str) -> Result<Self> {
        serde_json::from_str(content)
            .map_err(|e| OrchestratorError::InvalidConfig(format!("invalid JSON: {e}")))
    }

    /// Checks everything that can be checked without reading the image.
    pub fn validate(&self) -> Result<()> {
        if !(self.pi > 0. && self.pi < 1.) {
            return Err(OrchestratorError::InvalidConfig(format!(
                "pi must be inside (0, 1), got {}",
                self.pi
            )));
        }

        if !self.beta.is_finite() {
            return Err(OrchestratorError::InvalidConfig(format!(
                "beta must be finite, got {}",
                self.beta
            )));
        }

        if self.cluster.workers() == 0 {
            return Err(OrchestratorError::InvalidConfig(
                "at least one worker is required".into(),
            ));
        }

        Ok(())
    }
}
