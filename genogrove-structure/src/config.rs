use std::fs::read_to_string;
use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const DEFAULT_ORDER: usize = 3;

/// How a bulk insertion treats the order of its batch.
#[derive(Deserialize, Serialize, Debug, Clone, Copy, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum BulkSortedness {
    /// The batch is already sorted; it is validated and rejected if it is not.
    Sorted,
    /// The batch is sorted before insertion.
    Unsorted,
    /// Scan the batch once and sort only if needed.
    #[default]
    Auto,
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub struct GroveConfig {
    #[serde(default = "default_order")]
    pub order: usize,
    #[serde(default)]
    pub bulk_sortedness: BulkSortedness,
}

fn default_order() -> usize {
    DEFAULT_ORDER
}

impl Default for GroveConfig {
    fn default() -> Self {
        Self {
            order: DEFAULT_ORDER,
            bulk_sortedness: BulkSortedness::default(),
        }
    }
}

#[derive(Error, Debug)]
pub enum GroveConfigError {
    #[error("Invalid order {0} in grove config: order must be at least 2")]
    InvalidOrder(usize),
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Toml(#[from] toml::de::Error),
}

pub type GroveConfigResult<T> = std::result::Result<T, GroveConfigError>;

impl GroveConfig {
    pub fn with_order(order: usize) -> Self {
        Self {
            order,
            ..Self::default()
        }
    }

    pub fn validate(&self) -> GroveConfigResult<()> {
        if self.order < 2 {
            return Err(GroveConfigError::InvalidOrder(self.order));
        }
        Ok(())
    }
}

impl FromStr for GroveConfig {
    type Err = GroveConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let config: GroveConfig = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }
}

impl TryFrom<&Path> for GroveConfig {
    type Error = GroveConfigError;

    fn try_from(path: &Path) -> Result<Self, Self::Error> {
        let toml_str = read_to_string(path)?;
        toml_str.parse()
    }
}
