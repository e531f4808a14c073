//! Container: a named collection of XML documents
//!
//! A [`Container`] owns one storage handle, the update context every write
//! goes through, and the alias that scopes queries to it. Opening negotiates
//! access: read-write first, read-only once if that fails.
//!
//! Every operation returns a `Result` and also mirrors its outcome into the
//! container's [`ErrorState`], so callers that only hold the handle can still
//! ask what the last operation did.

mod binder;
mod error_state;
mod negotiate;

pub use binder::QueryBinder;
pub use error_state::ErrorState;
pub use negotiate::negotiate;

use crate::cursor::ResultCursor;
use crate::engine::encoding::decode_xml;
use crate::engine::{
    AccessMode, ContainerConfig, Document, Manager, Results, StorageHandle, UpdateContext,
};
use crate::error::StoreError;
use crate::query::{EvaluationType, QueryContext, QueryFlags, ReturnType};
use serde::{Deserialize, Serialize};
use std::cell::RefCell;
use std::collections::BTreeMap;
use std::path::Path;
use tracing::{debug, info};

/// Alias registered for a container unless configured otherwise.
pub const DEFAULT_ALIAS: &str = "docstore";

/// An alias is quoted into `collection('<alias>')`, so it must be non-empty
/// and free of quotes and whitespace.
pub fn is_valid_alias(alias: &str) -> bool {
    !alias.is_empty()
        && !alias.contains(['\'', '"'])
        && !alias.chars().any(char::is_whitespace)
}

/// Query settings applied by [`Container::query`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryDefaults {
    #[serde(default)]
    pub return_type: ReturnType,
    #[serde(default)]
    pub evaluation: EvaluationType,
    #[serde(default = "default_true")]
    pub well_formed_only: bool,
}

fn default_true() -> bool {
    true
}

impl Default for QueryDefaults {
    fn default() -> Self {
        Self {
            return_type: ReturnType::LiveValues,
            evaluation: EvaluationType::Lazy,
            well_formed_only: true,
        }
    }
}

/// Settings used when opening a container.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpenOptions {
    pub alias: String,
    pub allow_dtd: bool,
    pub sync_every: u64,
    pub query: QueryDefaults,
}

impl Default for OpenOptions {
    fn default() -> Self {
        Self {
            alias: DEFAULT_ALIAS.to_string(),
            allow_dtd: false,
            sync_every: 0,
            query: QueryDefaults::default(),
        }
    }
}

impl OpenOptions {
    fn container_config(&self, mode: AccessMode) -> ContainerConfig {
        let mut config = ContainerConfig::default();
        config.set_read_only(mode == AccessMode::ReadOnly);
        config.set_allow_dtd(self.allow_dtd);
        config.set_sync_every(self.sync_every);
        config
    }
}

pub struct Container {
    manager: Manager,
    update: UpdateContext,
    handle: StorageHandle,
    alias: String,
    query_defaults: QueryDefaults,
    state: RefCell<ErrorState>,
}

impl Container {
    /// Open or create the container at `path` with a fresh manager.
    ///
    /// Open databases are tracked per process, so a second open of the same
    /// path still falls back to read-only.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        Self::open_with(&Manager::new(), path, &OpenOptions::default())
    }

    /// Open or create the container at `path` through a shared manager.
    pub fn open_with(
        manager: &Manager,
        path: impl AsRef<Path>,
        options: &OpenOptions,
    ) -> Result<Self, StoreError> {
        let path = path.as_ref();
        if !is_valid_alias(&options.alias) {
            return Err(StoreError::InvalidName(format!(
                "Alias {:?} must be non-empty without quotes or whitespace",
                options.alias
            )));
        }
        let container = negotiate(|mode| Self::attempt(manager, path, options, mode))?;
        info!(
            path = %path.display(),
            alias = %container.alias,
            mode = %container.access_mode(),
            "Container open"
        );
        Ok(container)
    }

    fn attempt(
        manager: &Manager,
        path: &Path,
        options: &OpenOptions,
        mode: AccessMode,
    ) -> Result<Self, StoreError> {
        let config = options.container_config(mode);
        let update = manager.create_update_context(&config);
        let handle = if manager.exists_container(path) {
            manager.open_container(path, &config)?
        } else {
            manager.create_container(path, &config)?
        };
        if !manager.add_alias(&options.alias, handle.storage()) {
            return Err(StoreError::AliasTaken(options.alias.clone()));
        }
        Ok(Self {
            manager: manager.clone(),
            update,
            handle,
            alias: options.alias.clone(),
            query_defaults: options.query,
            state: RefCell::new(ErrorState::default()),
        })
    }

    pub fn alias(&self) -> &str {
        &self.alias
    }

    pub fn path(&self) -> &Path {
        self.handle.storage().path()
    }

    pub fn access_mode(&self) -> AccessMode {
        self.handle.mode()
    }

    pub fn manager(&self) -> &Manager {
        &self.manager
    }

    pub fn query_defaults(&self) -> QueryDefaults {
        self.query_defaults
    }

    /// Outcome of the most recent operation.
    pub fn error_state(&self) -> ErrorState {
        self.state.borrow().clone()
    }

    /// Writes applied through this container's update context.
    pub fn updates_applied(&self) -> u64 {
        self.update.applied()
    }

    // Write

    /// Insert a document from in-memory XML.
    pub fn put_xml(&mut self, name: &str, content: &str, replace: bool) -> Result<(), StoreError> {
        self.state.get_mut().reset();
        let result = Document::new(name, content).and_then(|doc| self.put(&doc, replace));
        self.state.get_mut().observe(result)
    }

    /// Insert an XML file; the document is named by the path as given.
    pub fn put_file(&mut self, path: impl AsRef<Path>, replace: bool) -> Result<(), StoreError> {
        let path = path.as_ref();
        let name = path.to_string_lossy().into_owned();
        self.put_file_as(&name, path, replace)
    }

    /// Insert an XML file under an explicit document name.
    ///
    /// The file is decoded from its declared encoding and stored as UTF-8.
    pub fn put_file_as(
        &mut self,
        name: &str,
        path: impl AsRef<Path>,
        replace: bool,
    ) -> Result<(), StoreError> {
        self.state.get_mut().reset();
        let result = std::fs::read(path.as_ref())
            .map_err(StoreError::from)
            .and_then(|bytes| decode_xml(name, &bytes))
            .and_then(|content| Document::new(name, content))
            .and_then(|doc| self.put(&doc, replace));
        self.state.get_mut().observe(result)
    }

    /// Insert a whole document, metadata and timestamp included.
    pub fn put_document(&mut self, doc: &Document, replace: bool) -> Result<(), StoreError> {
        self.state.get_mut().reset();
        let result = self.put(doc, replace);
        self.state.get_mut().observe(result)
    }

    /// Insert a document with metadata entries.
    pub fn put_xml_with_metadata(
        &mut self,
        name: &str,
        content: &str,
        metadata: BTreeMap<String, String>,
        replace: bool,
    ) -> Result<(), StoreError> {
        self.state.get_mut().reset();
        let result = Document::with_metadata(name, content, metadata)
            .and_then(|doc| self.put(&doc, replace));
        self.state.get_mut().observe(result)
    }

    /// Replacement deletes first and inserts second; the pair is not atomic.
    fn put(&mut self, doc: &Document, replace: bool) -> Result<(), StoreError> {
        let storage = self.handle.storage();
        if replace {
            let name = doc.name()?;
            if let Err(e) = self.update.delete_document(storage, name) {
                debug!(name, "No prior document replaced: {}", e);
            }
        }
        self.update.put_document(storage, doc)
    }

    /// Copy every document of the container at `source` into this one.
    ///
    /// Stops at the first failed insert; documents merged before it stay.
    /// Returns the number of documents merged.
    pub fn merge(&mut self, source: impl AsRef<Path>, replace: bool) -> Result<u64, StoreError> {
        self.state.get_mut().reset();
        let result = self.merge_from(source.as_ref(), replace);
        self.state.get_mut().observe(result)
    }

    fn merge_from(&mut self, source: &Path, replace: bool) -> Result<u64, StoreError> {
        let input = self
            .manager
            .open_container(source, &ContainerConfig::default())?;
        let mut merged = 0;
        for doc in Results::all(input.storage().iter()) {
            self.put(&doc?, replace)?;
            merged += 1;
        }
        info!(source = %source.display(), merged, "Merge complete");
        Ok(merged)
    }

    /// Delete a document; a missing document is an error.
    pub fn remove(&mut self, name: &str) -> Result<(), StoreError> {
        self.state.get_mut().reset();
        let result = self.update.delete_document(self.handle.storage(), name);
        self.state.get_mut().observe(result)
    }

    // Read

    /// Content of the named document.
    pub fn get(&self, name: &str) -> Result<String, StoreError> {
        self.begin();
        let result = self
            .fetch(name)
            .and_then(|doc| doc.content().map(str::to_string));
        self.state.borrow_mut().observe(result)
    }

    /// The named document with its metadata.
    pub fn get_document(&self, name: &str) -> Result<Document, StoreError> {
        self.begin();
        let result = self.fetch(name);
        self.state.borrow_mut().observe(result)
    }

    fn fetch(&self, name: &str) -> Result<Document, StoreError> {
        self.handle
            .storage()
            .get(name)?
            .ok_or_else(|| StoreError::DocumentNotFound(name.to_string()))
    }

    pub fn size(&self) -> u64 {
        self.begin();
        self.handle.storage().count()
    }

    /// Cursor over every document, fetched one at a time.
    pub fn get_all(&self) -> ResultCursor<'_> {
        self.begin();
        ResultCursor::new(self, Results::all(self.handle.storage().iter()))
    }

    /// Run `expression` against this container with the default settings.
    ///
    /// The expression is appended to `collection('<alias>')`, so it usually
    /// starts with `/`, `//` or a predicate.
    pub fn query(&self, expression: &str) -> Result<ResultCursor<'_>, StoreError> {
        self.binder().run(expression)
    }

    /// Run `expression` with an explicit context and delivery flags.
    pub fn query_with(
        &self,
        expression: &str,
        context: QueryContext,
        flags: QueryFlags,
    ) -> Result<ResultCursor<'_>, StoreError> {
        QueryBinder::from_parts(self, context, flags).run(expression)
    }

    /// Query builder starting from this container's defaults.
    pub fn binder(&self) -> QueryBinder<'_> {
        QueryBinder::new(self)
    }

    /// Flush pending writes and close the container.
    pub fn close(self) -> Result<(), StoreError> {
        self.handle.storage().flush()
    }

    pub(crate) fn begin(&self) {
        self.state.borrow_mut().reset();
    }

    pub(crate) fn record_error(&self, error: &StoreError) {
        self.state.borrow_mut().record(error);
    }
}

impl Drop for Container {
    fn drop(&mut self) {
        self.manager.remove_alias(&self.alias);
        debug!(alias = %self.alias, "Container released");
    }
}
