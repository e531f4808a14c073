//! Storage engine
//!
//! The engine owns everything below the container protocol: opening and
//! creating sled-backed container databases, the alias namespace that
//! `collection('alias')` resolves against, the update context used for
//! writes, and lazy document sequences for enumeration and queries.
//!
//! A [`Manager`] is a cheap, cloneable handle to an alias namespace. Open
//! databases are tracked per process, since sled locks a database directory
//! for the whole process: a container path has at most one read-write holder
//! at a time, and any number of read-only handles share its database.

pub mod document;
pub mod encoding;
pub mod results;
pub mod storage;
pub mod update;

pub use document::{Document, DocumentRecord};
pub use results::Results;
pub use storage::{Storage, StorageHandle};
pub use update::UpdateContext;

use crate::error::StoreError;
use crate::query::{CompiledQuery, EvaluationType, QueryContext, QueryFlags};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, OnceLock};
use tracing::debug;

/// Access requested for a container.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AccessMode {
    ReadWrite,
    ReadOnly,
}

impl std::fmt::Display for AccessMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AccessMode::ReadWrite => write!(f, "read-write"),
            AccessMode::ReadOnly => write!(f, "read-only"),
        }
    }
}

/// Per-open container settings.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContainerConfig {
    read_only: bool,
    allow_dtd: bool,
    sync_every: u64,
}

impl ContainerConfig {
    pub fn set_read_only(&mut self, read_only: bool) {
        self.read_only = read_only;
    }

    pub fn read_only(&self) -> bool {
        self.read_only
    }

    /// Accept documents that carry a DTD.
    pub fn set_allow_dtd(&mut self, allow_dtd: bool) {
        self.allow_dtd = allow_dtd;
    }

    pub fn allow_dtd(&self) -> bool {
        self.allow_dtd
    }

    /// Flush after this many writes; zero leaves flushing to sled.
    pub fn set_sync_every(&mut self, sync_every: u64) {
        self.sync_every = sync_every;
    }

    pub fn sync_every(&self) -> u64 {
        self.sync_every
    }

    pub fn access_mode(&self) -> AccessMode {
        if self.read_only {
            AccessMode::ReadOnly
        } else {
            AccessMode::ReadWrite
        }
    }
}

struct OpenEntry {
    db: sled::Db,
    writer: bool,
    readers: usize,
}

/// Databases open in this process, keyed by canonical path.
fn open_databases() -> &'static Mutex<HashMap<PathBuf, OpenEntry>> {
    static OPEN: OnceLock<Mutex<HashMap<PathBuf, OpenEntry>>> = OnceLock::new();
    OPEN.get_or_init(|| Mutex::new(HashMap::new()))
}

#[derive(Default)]
struct ManagerState {
    aliases: HashMap<String, Storage>,
}

/// Engine handle: opens containers and owns an alias namespace.
#[derive(Clone, Default)]
pub struct Manager {
    state: Arc<Mutex<ManagerState>>,
}

impl Manager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether container storage exists at `path`.
    pub fn exists_container(&self, path: &Path) -> bool {
        path.exists()
    }

    pub fn create_update_context(&self, config: &ContainerConfig) -> UpdateContext {
        UpdateContext::new(config.access_mode(), config.allow_dtd(), config.sync_every())
    }

    /// Open existing container storage with the configured access mode.
    pub fn open_container(
        &self,
        path: &Path,
        config: &ContainerConfig,
    ) -> Result<StorageHandle, StoreError> {
        if !self.exists_container(path) {
            return Err(StoreError::ContainerNotFound(path.to_path_buf()));
        }
        let key = dunce::canonicalize(path)?;
        let mode = config.access_mode();
        let mut open = open_databases().lock();

        if let Some(entry) = open.get_mut(&key) {
            match mode {
                AccessMode::ReadWrite if entry.writer => return Err(StoreError::Locked(key)),
                AccessMode::ReadWrite => entry.writer = true,
                AccessMode::ReadOnly => entry.readers += 1,
            }
            let storage = Storage::from_db(key.clone(), entry.db.clone())?;
            debug!(path = %key.display(), %mode, "Sharing open container");
            return Ok(StorageHandle::new(storage, mode, self.clone()));
        }

        let db = sled::Config::new()
            .path(&key)
            .open()
            .map_err(|e| open_failure(&key, e))?;
        let storage = Storage::from_db(key.clone(), db.clone())?;
        open.insert(
            key.clone(),
            OpenEntry {
                db,
                writer: mode == AccessMode::ReadWrite,
                readers: usize::from(mode == AccessMode::ReadOnly),
            },
        );
        debug!(path = %key.display(), %mode, "Opened container");
        Ok(StorageHandle::new(storage, mode, self.clone()))
    }

    /// Create new container storage at `path`, opened read-write.
    pub fn create_container(
        &self,
        path: &Path,
        config: &ContainerConfig,
    ) -> Result<StorageHandle, StoreError> {
        if config.read_only() {
            return Err(StoreError::ContainerNotFound(path.to_path_buf()));
        }
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let db = sled::Config::new()
            .path(path)
            .create_new(true)
            .open()
            .map_err(|e| open_failure(path, e))?;
        let key = dunce::canonicalize(path)?;
        let storage = Storage::from_db(key.clone(), db.clone())?;

        open_databases().lock().insert(
            key.clone(),
            OpenEntry {
                db,
                writer: true,
                readers: 0,
            },
        );
        debug!(path = %key.display(), "Created container");
        Ok(StorageHandle::new(storage, AccessMode::ReadWrite, self.clone()))
    }

    /// Give back a handle's slot; closes the database when nothing uses it.
    pub(crate) fn release(&self, path: &Path, mode: AccessMode) {
        let mut open = open_databases().lock();
        let Some(entry) = open.get_mut(path) else {
            return;
        };
        match mode {
            AccessMode::ReadWrite => entry.writer = false,
            AccessMode::ReadOnly => entry.readers = entry.readers.saturating_sub(1),
        }
        if !entry.writer && entry.readers == 0 {
            open.remove(path);
            debug!(path = %path.display(), "Closed container");
        }
    }

    /// Whether any handle currently holds `path` open.
    pub fn is_open(&self, path: &Path) -> bool {
        let key = dunce::canonicalize(path).unwrap_or_else(|_| path.to_path_buf());
        open_databases().lock().contains_key(&key)
    }

    /// Bind `alias` to `storage`. Returns false if the alias is taken.
    pub fn add_alias(&self, alias: &str, storage: &Storage) -> bool {
        let mut state = self.state.lock();
        if state.aliases.contains_key(alias) {
            return false;
        }
        state.aliases.insert(alias.to_string(), storage.clone());
        true
    }

    pub fn remove_alias(&self, alias: &str) -> bool {
        self.state.lock().aliases.remove(alias).is_some()
    }

    pub fn resolve_alias(&self, alias: &str) -> Result<Storage, StoreError> {
        self.state
            .lock()
            .aliases
            .get(alias)
            .cloned()
            .ok_or_else(|| StoreError::UnknownCollection(alias.to_string()))
    }

    /// Evaluate `expression` and return the matching documents.
    pub fn query(
        &self,
        expression: &str,
        context: &QueryContext,
        flags: QueryFlags,
    ) -> Result<Results, StoreError> {
        let query = CompiledQuery::compile(expression, context)?;
        let storage = self.resolve_alias(query.collection())?;
        debug!(collection = query.collection(), expression, "Evaluating query");

        let results = Results::filtered(storage.iter(), query, flags, context.return_type);
        if context.evaluation == EvaluationType::Eager || !flags.lazy_docs {
            results.into_eager()
        } else {
            Ok(results)
        }
    }
}

fn open_failure(path: &Path, error: sled::Error) -> StoreError {
    StoreError::OpenFailure {
        path: path.to_path_buf(),
        message: error.to_string(),
    }
}
