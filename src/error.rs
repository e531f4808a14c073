//! Error types for the docstore document store.

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised by containers, the storage engine and queries
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Failed to open container {path:?}: {message}")]
    OpenFailure { path: PathBuf, message: String },

    #[error("Container {0:?} does not exist")]
    ContainerNotFound(PathBuf),

    #[error("Container {0:?} is locked for writing by another handle")]
    Locked(PathBuf),

    #[error("Unable to add alias \"{0}\"")]
    AliasTaken(String),

    #[error("Write failed: {0}")]
    WriteFailure(String),

    #[error("Container is open read-only")]
    ReadOnly,

    #[error("Document already exists: {0}")]
    DocumentExists(String),

    #[error("Document not found: {0}")]
    DocumentNotFound(String),

    #[error("Invalid document name: {0:?}")]
    InvalidName(String),

    #[error("Document {name} is not well-formed XML: {message}")]
    MalformedXml { name: String, message: String },

    #[error("Query failed: {0}")]
    QueryFailure(String),

    #[error("Unknown collection: {0}")]
    UnknownCollection(String),

    #[error("Storage error: {0}")]
    Storage(#[from] sled::Error),

    #[error("Record encoding error: {0}")]
    Codec(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

impl From<config::ConfigError> for StoreError {
    fn from(err: config::ConfigError) -> Self {
        StoreError::ConfigError(err.to_string())
    }
}

impl From<bincode::Error> for StoreError {
    fn from(err: bincode::Error) -> Self {
        StoreError::Codec(err.to_string())
    }
}
