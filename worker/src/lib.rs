pub mod bootstrap;
pub mod builder;
pub mod error;
pub mod halo;
pub mod metrics;
pub mod metropolis;
pub mod params;
pub mod partition;
pub mod service;
pub mod topology;
pub mod worker;

pub use builder::WorkerBuilder;
pub use error::{Result, WorkerErr};
pub use params::RunParams;
pub use partition::Partition;
pub use worker::Worker;
