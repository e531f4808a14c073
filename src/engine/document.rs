//! Document records and the lazy document handle.
//!
//! A document is stored as one entry in the container's `documents` tree:
//! the key is the UTF-8 document name and the value is a bincode-encoded
//! [`DocumentRecord`]. [`Document`] wraps the raw key/value pair and decodes
//! each part only when it is first asked for.

use crate::error::StoreError;
use chrono::{DateTime, TimeZone, Utc};
use roxmltree::ParsingOptions;
use serde::{Deserialize, Serialize};
use sled::IVec;
use std::cell::OnceCell;
use std::collections::BTreeMap;

/// Persisted form of a document
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentRecord {
    pub content: String,
    pub metadata: BTreeMap<String, String>,
    /// Milliseconds since the Unix epoch
    pub modified: i64,
}

/// A named XML document with deferred decoding of its name and record.
#[derive(Debug, Clone)]
pub struct Document {
    key: IVec,
    raw: IVec,
    name: OnceCell<String>,
    record: OnceCell<DocumentRecord>,
}

impl Document {
    /// Build a new document from in-memory content.
    pub fn new(name: impl Into<String>, content: impl Into<String>) -> Result<Self, StoreError> {
        Self::with_metadata(name, content, BTreeMap::new())
    }

    /// Build a new document carrying metadata entries.
    pub fn with_metadata(
        name: impl Into<String>,
        content: impl Into<String>,
        metadata: BTreeMap<String, String>,
    ) -> Result<Self, StoreError> {
        let name = name.into();
        if name.is_empty() {
            return Err(StoreError::InvalidName(name));
        }
        let record = DocumentRecord {
            content: content.into(),
            metadata,
            modified: Utc::now().timestamp_millis(),
        };
        let raw = bincode::serialize(&record)?;
        Ok(Self {
            key: IVec::from(name.as_bytes()),
            raw: IVec::from(raw),
            name: OnceCell::from(name),
            record: OnceCell::from(record),
        })
    }

    /// Wrap a stored key/value pair without decoding either half.
    pub(crate) fn from_raw(key: IVec, raw: IVec) -> Self {
        Self {
            key,
            raw,
            name: OnceCell::new(),
            record: OnceCell::new(),
        }
    }

    pub(crate) fn key(&self) -> &[u8] {
        &self.key
    }

    pub(crate) fn raw(&self) -> &IVec {
        &self.raw
    }

    /// Document name, decoded on first access.
    pub fn name(&self) -> Result<&str, StoreError> {
        if let Some(name) = self.name.get() {
            return Ok(name);
        }
        let decoded = std::str::from_utf8(&self.key)
            .map_err(|e| StoreError::Codec(format!("Document name is not UTF-8: {}", e)))?
            .to_string();
        Ok(self.name.get_or_init(|| decoded))
    }

    /// Document content, decoded on first access.
    pub fn content(&self) -> Result<&str, StoreError> {
        Ok(&self.record()?.content)
    }

    pub fn metadata(&self) -> Result<&BTreeMap<String, String>, StoreError> {
        Ok(&self.record()?.metadata)
    }

    /// Time of the last put of this document.
    pub fn modified(&self) -> Result<DateTime<Utc>, StoreError> {
        let millis = self.record()?.modified;
        Utc.timestamp_millis_opt(millis)
            .single()
            .ok_or_else(|| StoreError::Codec(format!("Invalid modification time: {}", millis)))
    }

    /// Decode both name and record now.
    pub fn materialize(&self) -> Result<(), StoreError> {
        self.name()?;
        self.record()?;
        Ok(())
    }

    /// Whether the record half has been decoded.
    pub fn is_materialized(&self) -> bool {
        self.record.get().is_some()
    }

    /// Check that the content parses as XML.
    pub fn check_well_formed(&self, allow_dtd: bool) -> Result<(), StoreError> {
        let mut options = ParsingOptions::default();
        options.allow_dtd = allow_dtd;
        roxmltree::Document::parse_with_options(self.content()?, options)
            .map(|_| ())
            .map_err(|e| StoreError::MalformedXml {
                name: self.name().unwrap_or_default().to_string(),
                message: e.to_string(),
            })
    }

    fn record(&self) -> Result<&DocumentRecord, StoreError> {
        if let Some(record) = self.record.get() {
            return Ok(record);
        }
        let decoded: DocumentRecord = bincode::deserialize(&self.raw)?;
        Ok(self.record.get_or_init(|| decoded))
    }
}
