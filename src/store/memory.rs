use std::collections::HashMap;

use super::{ConfigRecord, DatasetStore};
use crate::{LoaderErr, Result, resolver::ConfigId};

/// A dataset store that keeps every dataset in memory.
#[derive(Debug, Clone, Default)]
pub struct InMemoryStore {
    datasets: HashMap<String, HashMap<ConfigId, ConfigRecord>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a configuration to a dataset, creating the dataset if needed.
    ///
    /// # Arguments
    /// * `dataset_name` - The dataset the configuration belongs to.
    /// * `id` - The configuration's identifier.
    /// * `record` - The configuration's tensors.
    pub fn insert(&mut self, dataset_name: &str, id: ConfigId, record: ConfigRecord) {
        self.datasets
            .entry(dataset_name.to_string())
            .or_default()
            .insert(id, record);
    }

    /// Builder flavour of `insert`.
    pub fn with(mut self, dataset_name: &str, id: ConfigId, record: ConfigRecord) -> Self {
        self.insert(dataset_name, id, record);
        self
    }
}

impl DatasetStore for InMemoryStore {
    fn load(&self, dataset_name: &str) -> Result<HashMap<ConfigId, ConfigRecord>> {
        self.datasets
            .get(dataset_name)
            .cloned()
            .ok_or_else(|| LoaderErr::InvalidConfig(format!("unknown dataset {dataset_name:?}")))
    }
}

#[cfg(test)]
mod tests {
    use ndarray::{Array1, Array4};

    use super::*;
    use crate::{config::FEATURES, store::Goos};

    #[test]
    fn load_returns_inserted_records() {
        let mut mask = Array1::zeros(10);
        mask[0] = 1.0;
        let record =
            ConfigRecord::new(Array4::zeros((2, 1, 3, FEATURES)), Goos::Absent, mask).unwrap();

        let store = InMemoryStore::new().with("balls", ConfigId::new("worldm1", 1, 0), record);

        let loaded = store.load("balls").unwrap();
        assert_eq!(loaded.len(), 1);
        assert!(loaded.contains_key(&ConfigId::new("worldm1", 1, 0)));
        assert!(store.load("cubes").is_err());
    }
}
