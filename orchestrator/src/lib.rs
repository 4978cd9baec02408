pub mod configs;
pub mod decomposition;
pub mod error;
pub mod image;
mod local;
mod session;

use std::net::SocketAddr;

use comms::specs::worker::WorkerSpec;
use log::info;
use worker::params::iteration_share;

pub use configs::{ClusterConfig, RunConfig};
pub use error::OrchestratorError;
pub use image::Image;
pub use local::{LocalCluster, LocalSession};
pub use session::{Denoised, Session};

use crate::{decomposition::Band, error::Result};

/// Reads the input image, denoises it and writes the result.
///
/// # Errors
/// Returns an `OrchestratorError` if the config is invalid, the input can't be read,
/// any worker fails or the output can't be written.
pub async fn run(config: &RunConfig) -> Result<Denoised> {
    config.validate()?;

    let image = Image::read(&config.input)?;
    info!(width = image.width(), height = image.height(); "read input image");

    let denoised = denoise(&image, config).await?;
    denoised.image.write(&config.output)?;
    info!("wrote denoised image to {}", config.output.display());

    Ok(denoised)
}

/// Denoises `image` with the cluster described by `config`.
///
/// The image is split into bands before contacting any worker, so an image that
/// can't be split evenly fails without side effects.
///
/// # Errors
/// Returns an `OrchestratorError` if the config is invalid or any worker fails.
pub async fn denoise(image: &Image, config: &RunConfig) -> Result<Denoised> {
    config.validate()?;

    let workers = config.cluster.workers();
    let bands = decomposition::distribute(image.height(), workers)?;
    let iterations = iteration_share(config.iterations, workers);
    info!(
        workers = workers,
        rows_per_worker = image.height() / workers,
        iterations = iterations;
        "distributed the image"
    );

    match &config.cluster {
        ClusterConfig::Local { .. } => {
            let specs = worker_specs(config, image, &bands, iterations, &[]);
            let (cluster, mut session) = LocalCluster::spawn(workers);

            let outcome = session.run(image, &bands, specs).await;
            drop(session);
            let joined = cluster.join().await;

            settle(outcome, joined)
        }
        ClusterConfig::Remote { worker_addrs } => {
            let addrs = resolve(worker_addrs).await?;
            let specs = worker_specs(config, image, &bands, iterations, &addrs);

            let mut session = Session::connect(&addrs).await?;
            session.run(image, &bands, specs).await
        }
    }
}

/// Combines the session's outcome with the local workers' own, a worker's failure
/// names the cause while the session only sees its effect on the first band it reads.
fn settle(outcome: Result<Denoised>, joined: Result<()>) -> Result<Denoised> {
    match (outcome, joined) {
        (_, Err(e)) => Err(e),
        (outcome, Ok(())) => outcome,
    }
}

/// The spec of each band's worker, each pointing at the address of the worker below.
fn worker_specs(
    config: &RunConfig,
    image: &Image,
    bands: &[Band],
    iterations: usize,
    addrs: &[SocketAddr],
) -> Vec<WorkerSpec> {
    bands
        .iter()
        .map(|band| WorkerSpec {
            rank: band.rank,
            workers: bands.len(),
            width: image.width(),
            rows: band.len(),
            iterations,
            beta: config.beta,
            pi: config.pi,
            seed: config.seed,
            below: addrs.get(band.rank).copied(),
        })
        .collect()
}

async fn resolve(worker_addrs: &[String]) -> Result<Vec<SocketAddr>> {
    let mut addrs = Vec::with_capacity(worker_addrs.len());

    for addr in worker_addrs {
        let resolved = tokio::net::lookup_host(addr.as_str())
            .await
            .map_err(|source| OrchestratorError::ConnectionFailed {
                addr: addr.clone(),
                source,
            })?
            .next()
            .ok_or_else(|| {
                OrchestratorError::InvalidConfig(format!("'{addr}' doesn't resolve to any address"))
            })?;

        addrs.push(resolved);
    }

    Ok(addrs)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn worker_failures_win_over_the_session_symptom() {
        let symptom = OrchestratorError::WorkerError {
            rank: 1,
            msg: "neighbour link closed at step 0".into(),
        };
        let cause = OrchestratorError::WorkerError {
            rank: 2,
            msg: "row length mismatch at step 0: got 4, expected 3".into(),
        };

        let settled = settle(Err(symptom), Err(cause));
        assert!(matches!(
            settled,
            Err(OrchestratorError::WorkerError { rank: 2, .. })
        ));
    }

    #[test]
    fn session_failures_stand_when_the_workers_succeed() {
        let outcome = Err(OrchestratorError::Protocol {
            rank: 1,
            detail: "expected a row, got control/report".into(),
        });

        assert!(matches!(
            settle(outcome, Ok(())),
            Err(OrchestratorError::Protocol { rank: 1, .. })
        ));
    }
}
