//! Environment source: DOCSTORE__SECTION__KEY variables.

use config::builder::DefaultState;
use config::ConfigBuilder;
use config::Environment;

/// Environment variables override every file source.
///
/// `DOCSTORE__CONTAINER__ALIAS=books` sets `container.alias`.
pub fn add_to_builder(builder: ConfigBuilder<DefaultState>) -> ConfigBuilder<DefaultState> {
    builder.add_source(
        Environment::with_prefix("DOCSTORE")
            .prefix_separator("__")
            .separator("__")
            .try_parsing(true),
    )
}
