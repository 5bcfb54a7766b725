//! Batching of variable-size particle/goo trajectories for per-object prediction models.
//!
//! A dataset is a set of configurations, each holding the trajectories of a fixed amount of
//! particles moving among a fixed amount of static goos. The loader resolves which
//! configurations to use, splits their per-particle samples into fixed-size batches that never
//! cross a configuration boundary and materializes any of those batches on demand.

pub mod assembler;
pub mod config;
pub mod error;
pub mod loader;
mod memory;
pub mod plan;
pub mod resolver;
pub mod sampling;
pub mod store;

pub use assembler::Batch;
pub use config::{Device, LoaderConfig, SamplingPolicy};
pub use error::{LoaderErr, Result};
pub use loader::TrajectoryLoader;
pub use resolver::ConfigId;
