mod run;

pub use run::{ClusterConfig, RunConfig};
