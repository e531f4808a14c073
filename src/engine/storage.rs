//! Sled-backed container storage

use crate::engine::document::Document;
use crate::engine::{AccessMode, Manager};
use crate::error::StoreError;
use sled::CompareAndSwapError;
use std::path::{Path, PathBuf};

const DOCUMENTS_TREE: &str = "documents";

/// One open container database.
///
/// Cloning is cheap: the underlying sled handles are reference counted, so
/// every clone sees the same documents.
#[derive(Clone)]
pub struct Storage {
    path: PathBuf,
    db: sled::Db,
    documents: sled::Tree,
}

impl Storage {
    pub(crate) fn from_db(path: PathBuf, db: sled::Db) -> Result<Self, StoreError> {
        let documents = db.open_tree(DOCUMENTS_TREE)?;
        Ok(Self {
            path,
            db,
            documents,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn get(&self, name: &str) -> Result<Option<Document>, StoreError> {
        Ok(self
            .documents
            .get(name.as_bytes())?
            .map(|raw| Document::from_raw(sled::IVec::from(name.as_bytes()), raw)))
    }

    pub fn count(&self) -> u64 {
        self.documents.len() as u64
    }

    /// Raw iterator over every stored document, in name order.
    pub(crate) fn iter(&self) -> sled::Iter {
        self.documents.iter()
    }

    /// Insert a document whose name must not exist yet.
    pub(crate) fn insert(&self, doc: &Document) -> Result<(), StoreError> {
        match self
            .documents
            .compare_and_swap(doc.key(), None::<&[u8]>, Some(doc.raw().clone()))?
        {
            Ok(()) => Ok(()),
            Err(CompareAndSwapError { .. }) => {
                Err(StoreError::DocumentExists(doc.name()?.to_string()))
            }
        }
    }

    /// Remove a document, failing when it does not exist.
    pub(crate) fn delete(&self, name: &str) -> Result<(), StoreError> {
        match self.documents.remove(name.as_bytes())? {
            Some(_) => Ok(()),
            None => Err(StoreError::DocumentNotFound(name.to_string())),
        }
    }

    pub fn flush(&self) -> Result<(), StoreError> {
        self.db.flush()?;
        Ok(())
    }
}

/// Storage plus the access mode it was opened with.
///
/// Dropping the handle returns its slot to the [`Manager`]: a read-write
/// handle gives up the write lock, and the database is closed once no handle
/// refers to it.
pub struct StorageHandle {
    storage: Storage,
    mode: AccessMode,
    manager: Manager,
}

impl StorageHandle {
    pub(crate) fn new(storage: Storage, mode: AccessMode, manager: Manager) -> Self {
        Self {
            storage,
            mode,
            manager,
        }
    }

    pub fn storage(&self) -> &Storage {
        &self.storage
    }

    pub fn mode(&self) -> AccessMode {
        self.mode
    }
}

impl Drop for StorageHandle {
    fn drop(&mut self) {
        if let Err(e) = self.storage.flush() {
            tracing::warn!(path = %self.storage.path.display(), "Flush on close failed: {}", e);
        }
        self.manager.release(&self.storage.path, self.mode);
    }
}
