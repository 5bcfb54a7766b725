use std::{
    collections::HashMap,
    fs,
    path::{Path, PathBuf},
};

use log::{debug, info};
use ndarray::{Array1, ArrayD, Dimension, IxDyn};
use serde::{Deserialize, Serialize};

use super::{ConfigRecord, DatasetStore, Goos};
use crate::{Result, resolver::ConfigId};

/// A dense tensor as stored on disk, row-major.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawTensor {
    pub shape: Vec<usize>,
    pub data: Vec<f32>,
}

impl RawTensor {
    fn into_array<D: Dimension>(self) -> Result<ndarray::Array<f32, D>> {
        let array = ArrayD::from_shape_vec(IxDyn(&self.shape), self.data)?;
        Ok(array.into_dimensionality::<D>()?)
    }
}

/// A configuration as stored on disk.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawRecord {
    pub particles: RawTensor,
    #[serde(default)]
    pub goos: Option<RawTensor>,
    pub mask: Vec<f32>,
}

impl RawRecord {
    fn into_record(self) -> Result<ConfigRecord> {
        let goos = match self.goos {
            Some(goos) => Goos::from_tensor(goos.into_array()?),
            None => Goos::Absent,
        };

        ConfigRecord::new(self.particles.into_array()?, goos, Array1::from(self.mask))
    }
}

/// A dataset store reading `<root>/<dataset_name>.json` files, each one an object mapping
/// configuration identifiers to their `RawRecord`.
#[derive(Debug, Clone)]
pub struct JsonStore {
    root: PathBuf,
}

impl JsonStore {
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    /// The file backing `dataset_name`.
    pub fn path(&self, dataset_name: &str) -> PathBuf {
        self.root.join(format!("{dataset_name}.json"))
    }
}

impl DatasetStore for JsonStore {
    fn load(&self, dataset_name: &str) -> Result<HashMap<ConfigId, ConfigRecord>> {
        let path = self.path(dataset_name);
        info!("loading dataset {dataset_name} from {}", path.display());

        let raw = fs::read_to_string(&path)?;
        let raw: HashMap<String, RawRecord> = serde_json::from_str(&raw)?;

        let mut records = HashMap::with_capacity(raw.len());
        for (name, record) in raw {
            let id: ConfigId = name.parse()?;
            let record = record.into_record()?;
            debug!("loaded {id} with {} example(s)", record.examples());
            records.insert(id, record);
        }

        Ok(records)
    }
}
