//! Config loading entry point: merges every source and deserializes once.

use crate::config::merge::merge_policy;
use crate::config::sources::{environment, global_file};
use crate::config::StoreConfig;
use crate::error::StoreError;
use config::File;
use std::path::Path;

/// Loads [`StoreConfig`] from the layered sources.
pub struct ConfigLoader;

impl ConfigLoader {
    /// Defaults, global file, environment.
    pub fn load() -> Result<StoreConfig, StoreError> {
        Self::load_layers(None)
    }

    /// Defaults, global file, `path`, environment. The file must exist.
    pub fn load_from_file(path: &Path) -> Result<StoreConfig, StoreError> {
        if !path.exists() {
            return Err(StoreError::ConfigError(format!(
                "Configuration file not found: {}",
                path.display()
            )));
        }
        Self::load_layers(Some(path))
    }

    /// Load from `path` when given, otherwise from the default layers.
    pub fn load_optional(path: Option<&Path>) -> Result<StoreConfig, StoreError> {
        match path {
            Some(path) => Self::load_from_file(path),
            None => Self::load(),
        }
    }

    fn load_layers(explicit: Option<&Path>) -> Result<StoreConfig, StoreError> {
        let mut builder = merge_policy::builder_with_defaults()?;
        builder = global_file::add_to_builder(builder)?;
        if let Some(path) = explicit {
            builder = builder.add_source(File::from(path).required(true));
        }
        builder = environment::add_to_builder(builder);

        let config: StoreConfig = builder.build()?.try_deserialize()?;
        config.validate().map_err(|errors| {
            StoreError::ConfigError(format!(
                "Configuration validation failed:\n{}",
                errors.join("\n")
            ))
        })?;
        Ok(config)
    }
}
