use std::path::PathBuf;

use anyhow::{Result, bail};
use clap::{Parser, ValueHint};
use orchestrator::{ClusterConfig, RunConfig};

#[derive(Parser, Debug)]
#[command(
    name = "orchestrator",
    version,
    about = "Distributed Ising model image denoiser"
)]
struct Cli {
    /// JSON run config, flags given alongside override its fields
    #[arg(short, long, value_hint = ValueHint::FilePath)]
    config: Option<String>,

    /// Coupling strength between neighbouring pixels
    #[arg(long)]
    beta: Option<f64>,
    /// Prior probability of a pixel having been flipped by noise
    #[arg(long)]
    pi: Option<f64>,
    /// Total iteration budget, split evenly among the workers
    #[arg(short, long)]
    iterations: Option<usize>,
    /// Base seed of the workers' random streams
    #[arg(long)]
    seed: Option<u64>,

    /// Run this many workers inside this process
    #[arg(long, conflicts_with = "worker")]
    local: Option<usize>,
    /// Address of a worker process, once per worker, top band first
    #[arg(short, long)]
    worker: Vec<String>,

    /// Noisy input image path
    #[arg(value_hint = ValueHint::FilePath)]
    input: Option<PathBuf>,
    /// Denoised output image path
    #[arg(value_hint = ValueHint::FilePath)]
    output: Option<PathBuf>,
}

fn cluster(cli: &Cli) -> Option<ClusterConfig> {
    match (cli.local, cli.worker.is_empty()) {
        (Some(workers), _) => Some(ClusterConfig::Local { workers }),
        (None, false) => Some(ClusterConfig::Remote {
            worker_addrs: cli.worker.clone(),
        }),
        (None, true) => None,
    }
}

fn build_config(cli: Cli) -> Result<RunConfig> {
    let mut cfg = match &cli.config {
        Some(path) => RunConfig::load(path)?,
        None => {
            let (Some(input), Some(output)) = (&cli.input, &cli.output) else {
                bail!("the input and output paths are required without --config");
            };

            let Some(cluster) = cluster(&cli) else {
                bail!("either --local or at least one --worker is required without --config");
            };

            RunConfig::new(input, output, cluster)
        }
    };

    if let Some(cluster) = cluster(&cli) {
        cfg.cluster = cluster;
    }
    if let Some(v) = cli.input {
        cfg.input = v;
    }
    if let Some(v) = cli.output {
        cfg.output = v;
    }
    if let Some(v) = cli.beta {
        cfg.beta = v;
    }
    if let Some(v) = cli.pi {
        cfg.pi = v;
    }
    if let Some(v) = cli.iterations {
        cfg.iterations = v;
    }
    if cli.seed.is_some() {
        cfg.seed = cli.seed;
    }

    cfg.validate()?;
    Ok(cfg)
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();

    let cli = Cli::parse();
    let cfg = build_config(cli)?;
    let denoised = orchestrator::run(&cfg).await?;

    for report in &denoised.reports {
        println!(
            "worker {}: {} iterations, {} flips ({:.2}%)",
            report.rank,
            report.iterations,
            report.flips,
            report.flip_percentage()
        );
    }
    println!("denoised image written to {}", cfg.output.display());

    Ok(())
}
