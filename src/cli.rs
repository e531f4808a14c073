//! CLI domain: parse, route, help, output, and presentation only.
//! No storage logic; the single route table dispatches to the container.

mod help;
mod output;
mod parse;
mod presentation;
mod route;

pub use help::{command_name, is_mutation};
pub use output::map_error;
pub use parse::{Cli, Commands, ListFormat};
pub use presentation::{
    format_document, format_documents, format_info, ContainerInfo, DocumentRow,
};
pub use route::RunContext;
