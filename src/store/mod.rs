mod json;
mod memory;
mod record;

use std::collections::HashMap;

pub use json::{JsonStore, RawRecord, RawTensor};
pub use memory::InMemoryStore;
pub use record::{ConfigRecord, Goos};

use crate::{Result, resolver::ConfigId};

/// Supplies the trajectories of every configuration of a dataset.
///
/// Loading happens once, eagerly, when a loader is built. Configurations the caller asks for
/// but the dataset doesn't have are simply absent from the returned map.
pub trait DatasetStore {
    /// Loads every configuration of a dataset.
    ///
    /// # Arguments
    /// * `dataset_name` - The logical name of the dataset.
    ///
    /// # Returns
    /// The records keyed by configuration, or an error if the dataset can't be read.
    fn load(&self, dataset_name: &str) -> Result<HashMap<ConfigId, ConfigRecord>>;
}
