//! Training configuration for the `digit-network` driver.
//!
//! Every field has a default, so a JSON file only needs to list what it changes:
//!
//! ```json
//! {
//!   "topology": [784, 100, 10],
//!   "cost": "cross_entropy",
//!   "learning_rate": 0.5,
//!   "seed": 42
//! }
//! ```

use crate::{error::ConfigError, network::InitPolicy};
use serde::{Deserialize, Serialize};
use std::{
    fs,
    num::NonZeroUsize,
    path::{Path, PathBuf},
};

/// Which cost function the output layer is trained against.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CostKind {
    #[default]
    Quadratic,
    CrossEntropy,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TrainingConfig {
    /// Layer sizes, input layer first.
    pub topology: Vec<usize>,
    pub epochs: usize,
    pub batch_size: usize,
    pub learning_rate: f64,
    pub cost: CostKind,
    pub init: InitPolicy,
    /// Seed for weight initialisation and shuffling. Absent means a fresh seed from the OS.
    pub seed: Option<u64>,
    /// Directory holding the MNIST IDX files.
    pub data_dir: PathBuf,
    /// How many of the training examples are held out for validation.
    pub validation_size: usize,
}

impl Default for TrainingConfig {
    fn default() -> Self {
        TrainingConfig {
            topology: vec![28 * 28, 30, 10],
            epochs: 30,
            batch_size: 10,
            learning_rate: 3.0,
            cost: CostKind::default(),
            init: InitPolicy::default(),
            seed: None,
            data_dir: PathBuf::from("data"),
            validation_size: 10_000,
        }
    }
}

impl TrainingConfig {
    pub fn from_file(path: &Path) -> Result<TrainingConfig, ConfigError> {
        let contents = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        TrainingConfig::from_json(&contents)
    }

    pub fn from_json(json: &str) -> Result<TrainingConfig, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Checks the values a training run cannot start without.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.topology.len() < 2 {
            return Err(ConfigError::Invalid(format!(
                "topology needs at least an input and an output layer, got {:?}",
                self.topology
            )));
        }
        if self.topology.contains(&0) {
            return Err(ConfigError::Invalid(format!(
                "topology has an empty layer: {:?}",
                self.topology
            )));
        }
        if self.epochs == 0 {
            return Err(ConfigError::Invalid("epochs must be at least 1".into()));
        }
        if self.batch_size == 0 {
            return Err(ConfigError::Invalid("batch_size must be at least 1".into()));
        }
        if !self.learning_rate.is_finite() || self.learning_rate <= 0.0 {
            return Err(ConfigError::Invalid(format!(
                "learning_rate must be a positive number, got {}",
                self.learning_rate
            )));
        }
        Ok(())
    }

    /// The batch size as the trainer takes it. Only meaningful after [`TrainingConfig::validate`].
    pub fn batch_size(&self) -> Result<NonZeroUsize, ConfigError> {
        NonZeroUsize::new(self.batch_size)
            .ok_or_else(|| ConfigError::Invalid("batch_size must be at least 1".into()))
    }
}
