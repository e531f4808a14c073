//! Command-name contract used for log fields.

use crate::cli::parse::Commands;

/// Stable command name (e.g. "put-xml", "query").
pub fn command_name(command: &Commands) -> &'static str {
    match command {
        Commands::PutFile { .. } => "put-file",
        Commands::PutXml { .. } => "put-xml",
        Commands::Import { .. } => "import",
        Commands::Merge { .. } => "merge",
        Commands::Remove { .. } => "remove",
        Commands::Get { .. } => "get",
        Commands::Size => "size",
        Commands::All { .. } => "all",
        Commands::Query { .. } => "query",
        Commands::Info { .. } => "info",
    }
}

/// Whether the command writes to the container.
pub fn is_mutation(command: &Commands) -> bool {
    matches!(
        command,
        Commands::PutFile { .. }
            | Commands::PutXml { .. }
            | Commands::Import { .. }
            | Commands::Merge { .. }
            | Commands::Remove { .. }
    )
}
