//! Merge rules: defaults, override order, conflict handling.

use crate::container::DEFAULT_ALIAS;
use config::Config;
use config::ConfigBuilder;
use config::ConfigError;

/// Create a Config builder with merge policy defaults applied.
pub fn builder_with_defaults() -> Result<ConfigBuilder<config::builder::DefaultState>, ConfigError>
{
    Config::builder()
        .set_default("container.alias", DEFAULT_ALIAS)?
        .set_default("container.allow_dtd", false)?
        .set_default("container.sync_every", 0)?
        .set_default("query.return_type", "live_values")?
        .set_default("query.evaluation", "lazy")?
        .set_default("query.well_formed_only", true)
}
