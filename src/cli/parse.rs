//! CLI parse: clap types for docstore. No behavior; definitions only.

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// docstore - XML document store
#[derive(Parser)]
#[command(name = "docstore")]
#[command(about = "Store, fetch and query XML documents in a container")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Container path (created if missing)
    #[arg(long, short = 'C', default_value = "docstore.db")]
    pub container: PathBuf,

    /// Configuration file path (layered over the global config)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Enable verbose logging (default: off)
    #[arg(long, default_value = "false")]
    pub verbose: bool,

    /// Log level (trace, debug, info, warn, error, off)
    #[arg(long)]
    pub log_level: Option<String>,

    /// Log format (json, text)
    #[arg(long)]
    pub log_format: Option<String>,

    /// Log output (stdout, stderr, file)
    #[arg(long)]
    pub log_output: Option<String>,

    /// Log file path (if output is "file")
    #[arg(long)]
    pub log_file: Option<PathBuf>,
}

/// Output rendering for document listings
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ListFormat {
    /// Name header followed by content
    Text,
    /// Name, size and modification time per document
    Table,
    /// JSON array with content and metadata
    Json,
    /// Document names only
    Names,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Store XML files; each document is named by its path
    PutFile {
        /// Files to store
        #[arg(required = true)]
        files: Vec<PathBuf>,
        /// Replace documents that already exist
        #[arg(long)]
        replace: bool,
        /// Store a single file under this name instead of its path
        #[arg(long)]
        name: Option<String>,
    },
    /// Store XML given on the command line (or stdin when omitted)
    PutXml {
        /// Document name
        name: String,
        /// XML content
        content: Option<String>,
        /// Replace the document if it already exists
        #[arg(long)]
        replace: bool,
        /// Metadata entry KEY=VALUE (repeatable)
        #[arg(long = "meta", value_name = "KEY=VALUE")]
        metadata: Vec<String>,
    },
    /// Store every XML file under a directory, named relative to it
    Import {
        /// Directory to walk
        dir: PathBuf,
        /// Replace documents that already exist
        #[arg(long)]
        replace: bool,
        /// File extension to import
        #[arg(long, default_value = "xml")]
        extension: String,
    },
    /// Copy all documents from another container into this one
    Merge {
        /// Source container path
        source: PathBuf,
        /// Replace documents that already exist
        #[arg(long)]
        replace: bool,
    },
    /// Remove documents by name
    Remove {
        #[arg(required = true)]
        names: Vec<String>,
    },
    /// Print a document's content
    Get {
        name: String,
        /// Output format (text or json)
        #[arg(long, default_value = "text")]
        format: String,
    },
    /// Print the number of documents
    Size,
    /// List every document
    All {
        #[arg(long, value_enum, default_value = "text")]
        format: ListFormat,
    },
    /// List documents matching an expression, e.g. "/book[author='Herbert']"
    Query {
        /// Expression appended to collection('<alias>')
        expression: String,
        #[arg(long, value_enum, default_value = "text")]
        format: ListFormat,
        /// Evaluate the whole query before printing
        #[arg(long)]
        eager: bool,
        /// Fail on stored documents that do not parse instead of skipping them
        #[arg(long)]
        strict: bool,
    },
    /// Show container path, alias, access mode and size
    Info {
        /// Output format (text or json)
        #[arg(long, default_value = "text")]
        format: String,
    },
}
