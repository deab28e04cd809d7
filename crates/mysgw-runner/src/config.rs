//! Runner configuration file.

use std::fs;
use std::path::Path;

use mysgw_bridge::{BindingTable, ConfigurationError, GatewaySettings, ItemKind};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors that can occur while loading the configuration file.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The file could not be read.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The file is not valid configuration YAML.
    #[error("YAML parsing error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// An item's binding string was rejected.
    #[error("item {item}: {source}")]
    Binding {
        /// Item name.
        item: String,
        #[source]
        source: ConfigurationError,
    },
}

/// One host item and the channel it is bound to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemConfig {
    /// Item name used by commands and state.
    pub name: String,
    /// Item type, which decides the accepted value kinds.
    pub kind: ItemKind,
    /// `node;sensor;TYPE`, e.g. `5;3;V_TEMP`.
    pub binding: String,
}

/// Contents of the runner's YAML file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunnerConfig {
    #[serde(flatten)]
    pub gateway: GatewaySettings,
    #[serde(default)]
    pub items: Vec<ItemConfig>,
    /// Log filter used when neither `RUST_LOG` nor `--log-level` is given.
    #[serde(default)]
    pub log_level: Option<String>,
}

impl RunnerConfig {
    /// Read and parse `path`.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path)?;
        Self::from_yaml(&text)
    }

    /// Parse YAML text.
    pub fn from_yaml(text: &str) -> Result<Self, ConfigError> {
        Ok(serde_yaml::from_str(text)?)
    }

    /// Bind every configured item.
    pub fn binding_table(&self) -> Result<BindingTable, ConfigError> {
        let mut table = BindingTable::new();
        for item in &self.items {
            table
                .bind(&item.name, item.kind, &item.binding)
                .map_err(|source| ConfigError::Binding { item: item.name.clone(), source })?;
        }
        Ok(table)
    }
}
