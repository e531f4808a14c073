//! Configuration System
//!
//! Layered configuration for container defaults, query settings and logging.
//! Sources are merged lowest precedence first: built-in defaults, the global
//! config file, an explicit `--config` file, then `DOCSTORE__*` environment
//! variables.

use crate::container::{is_valid_alias, OpenOptions, QueryDefaults, DEFAULT_ALIAS};
use crate::logging::LoggingConfig;
use serde::{Deserialize, Serialize};

mod facade;
mod merge;
mod sources;

pub use facade::ConfigLoader;
pub use sources::global_file::global_config_path;

/// Root configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Settings applied when opening containers
    #[serde(default)]
    pub container: ContainerSettings,

    /// Settings applied to queries run through a container
    #[serde(default)]
    pub query: QueryDefaults,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Container open settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContainerSettings {
    /// Alias used to scope queries to the container
    #[serde(default = "default_alias")]
    pub alias: String,

    /// Accept documents that declare a DTD
    #[serde(default)]
    pub allow_dtd: bool,

    /// Flush after this many writes (0 = leave it to the storage engine)
    #[serde(default)]
    pub sync_every: u64,
}

fn default_alias() -> String {
    DEFAULT_ALIAS.to_string()
}

impl Default for ContainerSettings {
    fn default() -> Self {
        Self {
            alias: default_alias(),
            allow_dtd: false,
            sync_every: 0,
        }
    }
}

impl StoreConfig {
    /// Validate the configuration, collecting every problem found.
    pub fn validate(&self) -> Result<(), Vec<String>> {
        let mut errors = Vec::new();

        let alias = &self.container.alias;
        if alias.is_empty() {
            errors.push("container.alias cannot be empty".to_string());
        } else if !is_valid_alias(alias) {
            errors.push(format!(
                "container.alias {:?} may not contain quotes or whitespace",
                alias
            ));
        }

        if let Err(e) = self.logging.validate() {
            errors.push(e);
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    /// Open options derived from this configuration.
    pub fn open_options(&self) -> OpenOptions {
        OpenOptions {
            alias: self.container.alias.clone(),
            allow_dtd: self.container.allow_dtd,
            sync_every: self.container.sync_every,
            query: self.query,
        }
    }
}
