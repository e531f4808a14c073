//! Docstore: an embedded XML document store
//!
//! Documents live in named containers backed by sled. A [`Container`] stores,
//! fetches, removes and merges documents, and runs path-expression queries
//! scoped to its alias. Results are read through a forward-only
//! [`ResultCursor`].

pub mod cli;
pub mod config;
pub mod container;
pub mod cursor;
pub mod engine;
pub mod error;
pub mod logging;
pub mod query;

pub use container::{Container, OpenOptions, QueryDefaults};
pub use cursor::{CursorState, ResultCursor};
pub use engine::{AccessMode, Document, Manager};
pub use error::StoreError;
pub use query::{EvaluationType, ReturnType};
