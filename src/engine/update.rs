//! Update context: the only path through which documents are written.

use crate::engine::document::Document;
use crate::engine::storage::Storage;
use crate::engine::AccessMode;
use crate::error::StoreError;
use tracing::debug;

/// Mutation handle for one container.
///
/// Every write is checked against the access mode and the well-formedness
/// policy. When `sync_every` is non-zero the storage is flushed after that
/// many writes.
#[derive(Debug)]
pub struct UpdateContext {
    mode: AccessMode,
    allow_dtd: bool,
    sync_every: u64,
    pending: u64,
    applied: u64,
}

impl UpdateContext {
    pub(crate) fn new(mode: AccessMode, allow_dtd: bool, sync_every: u64) -> Self {
        Self {
            mode,
            allow_dtd,
            sync_every,
            pending: 0,
            applied: 0,
        }
    }

    pub fn mode(&self) -> AccessMode {
        self.mode
    }

    /// Number of writes applied through this context.
    pub fn applied(&self) -> u64 {
        self.applied
    }

    pub fn put_document(&mut self, storage: &Storage, doc: &Document) -> Result<(), StoreError> {
        self.ensure_writable()?;
        doc.check_well_formed(self.allow_dtd)?;
        storage.insert(doc)?;
        let name = doc.name()?;
        debug!(name, "Document inserted");
        self.after_write(storage)
    }

    pub fn delete_document(&mut self, storage: &Storage, name: &str) -> Result<(), StoreError> {
        self.ensure_writable()?;
        storage.delete(name)?;
        debug!(name, "Document deleted");
        self.after_write(storage)
    }

    fn ensure_writable(&self) -> Result<(), StoreError> {
        match self.mode {
            AccessMode::ReadWrite => Ok(()),
            AccessMode::ReadOnly => Err(StoreError::ReadOnly),
        }
    }

    fn after_write(&mut self, storage: &Storage) -> Result<(), StoreError> {
        self.applied += 1;
        self.pending += 1;
        if self.sync_every > 0 && self.pending >= self.sync_every {
            storage.flush()?;
            self.pending = 0;
        }
        Ok(())
    }
}
