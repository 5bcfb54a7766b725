use std::{fs, num::NonZeroUsize, path::Path};

use serde::{Deserialize, Serialize};

use crate::{LoaderErr, Result};

/// The amount of scalars describing a single object at a single timestep.
pub const FEATURES: usize = 8;

/// The fixed amount of context slots every particle gets to see.
pub const MAX_CONTEXT: usize = 10;

/// How the next batch is chosen on every sampling call.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SamplingPolicy {
    /// Sweep the plan in access order, wrapping around.
    Sequential,
    /// Draw a uniformly random batch each call.
    Random,
    /// Weighted draw, `power` sharpens the weights.
    Priority { power: f64 },
}

/// Where the produced batches should live.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Device {
    #[default]
    Cpu,
    Accelerator,
}

fn default_sampling() -> SamplingPolicy {
    SamplingPolicy::Sequential
}

fn default_strict() -> bool {
    true
}

/// Immutable construction parameters of a `TrajectoryLoader`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoaderConfig {
    /// Logical name of the trajectory collection, resolved by the dataset store.
    pub dataset_name: String,
    /// Exact identifiers, world names or bracket abbreviations, empty means everything.
    #[serde(default)]
    pub specified_configs: Vec<String>,
    pub batch_size: NonZeroUsize,
    #[serde(default)]
    pub shuffle: bool,
    /// Express the future targets relative to the last past position.
    #[serde(default)]
    pub relative: bool,
    pub num_past: NonZeroUsize,
    pub window_size: NonZeroUsize,
    #[serde(default = "default_sampling")]
    pub sampling: SamplingPolicy,
    /// Fail when a configuration's sample count is not a multiple of the batch size.
    #[serde(default = "default_strict")]
    pub strict_alignment: bool,
    #[serde(default)]
    pub seed: Option<u64>,
    #[serde(default)]
    pub device: Device,
}

impl LoaderConfig {
    /// Creates a new `LoaderConfig` with sequential sampling, strict alignment and no shuffling.
    ///
    /// # Arguments
    /// * `dataset_name` - The dataset to load.
    /// * `batch_size` - The amount of expanded samples per batch.
    /// * `num_past` - The amount of timesteps used as input.
    /// * `window_size` - The total amount of timesteps per trajectory window.
    pub fn new(
        dataset_name: impl Into<String>,
        batch_size: NonZeroUsize,
        num_past: NonZeroUsize,
        window_size: NonZeroUsize,
    ) -> Self {
        Self {
            dataset_name: dataset_name.into(),
            specified_configs: Vec::new(),
            batch_size,
            shuffle: false,
            relative: false,
            num_past,
            window_size,
            sampling: default_sampling(),
            strict_alignment: default_strict(),
            seed: None,
            device: Device::Cpu,
        }
    }

    /// Reads and validates a `LoaderConfig` from a json file.
    ///
    /// # Arguments
    /// * `path` - The path of the json file.
    ///
    /// # Returns
    /// The parsed config or an error if reading, parsing or validating failed.
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let raw = fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&raw)?;
        config.validate()?;
        Ok(config)
    }

    /// Checks the constraints between fields that serde can't express.
    pub fn validate(&self) -> Result<()> {
        if self.num_past >= self.window_size {
            return Err(LoaderErr::InvalidConfig(format!(
                "num_past ({}) must be smaller than window_size ({})",
                self.num_past, self.window_size
            )));
        }

        match self.sampling {
            SamplingPolicy::Priority { power } if !power.is_finite() || power < 0.0 => {
                return Err(LoaderErr::InvalidConfig(format!(
                    "priority power must be finite and non-negative, got {power}"
                )));
            }
            _ => {}
        }

        Ok(())
    }

    /// The amount of future timesteps per window.
    pub fn num_future(&self) -> usize {
        self.window_size.get() - self.num_past.get()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn nz(n: usize) -> NonZeroUsize {
        NonZeroUsize::new(n).unwrap()
    }

    #[test]
    fn parses_minimal_json_with_defaults() {
        let raw = r#"{
            "dataset_name": "balls",
            "batch_size": 4,
            "num_past": 2,
            "window_size": 5
        }"#;

        let config: LoaderConfig = serde_json::from_str(raw).unwrap();
        config.validate().unwrap();

        assert_eq!(config.dataset_name, "balls");
        assert!(config.specified_configs.is_empty());
        assert_eq!(config.sampling, SamplingPolicy::Sequential);
        assert!(config.strict_alignment);
        assert_eq!(config.device, Device::Cpu);
        assert_eq!(config.num_future(), 3);
    }

    #[test]
    fn parses_priority_sampling() {
        let raw = r#"{
            "dataset_name": "balls",
            "batch_size": 4,
            "num_past": 2,
            "window_size": 5,
            "sampling": { "priority": { "power": 0.5 } },
            "device": "accelerator"
        }"#;

        let config: LoaderConfig = serde_json::from_str(raw).unwrap();
        assert_eq!(config.sampling, SamplingPolicy::Priority { power: 0.5 });
        assert_eq!(config.device, Device::Accelerator);
    }

    #[test]
    fn rejects_past_not_smaller_than_window() {
        let config = LoaderConfig::new("balls", nz(4), nz(5), nz(5));
        assert!(matches!(
            config.validate(),
            Err(LoaderErr::InvalidConfig(_))
        ));
    }

    #[test]
    fn rejects_negative_or_non_finite_priority_power() {
        for power in [-1.0, f64::NAN, f64::NEG_INFINITY] {
            let mut config = LoaderConfig::new("balls", nz(4), nz(2), nz(5));
            config.sampling = SamplingPolicy::Priority { power };
            assert!(matches!(
                config.validate(),
                Err(LoaderErr::InvalidConfig(_))
            ));
        }

        let mut config = LoaderConfig::new("balls", nz(4), nz(2), nz(5));
        config.sampling = SamplingPolicy::Priority { power: 0.0 };
        config.validate().unwrap();
    }

    #[test]
    fn rejects_zero_batch_size() {
        let raw = r#"{ "dataset_name": "b", "batch_size": 0, "num_past": 1, "window_size": 2 }"#;
        assert!(serde_json::from_str::<LoaderConfig>(raw).is_err());
    }
}
