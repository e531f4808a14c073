//! Forward-only cursor over query and enumeration results
//!
//! A [`ResultCursor`] walks a single-pass engine sequence. The current
//! document's name and content are decoded on first access and cached until
//! the next advance. Once the sequence runs out (or fails) the cursor is
//! exhausted for good, and name/content read as empty strings.

use crate::container::Container;
use crate::engine::{Document, Results};
use crate::error::StoreError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CursorState {
    Active,
    Exhausted,
}

/// Cursor borrowed from the container it reads; the container cannot be
/// written or dropped while the cursor lives.
pub struct ResultCursor<'c> {
    container: &'c Container,
    results: Option<Results>,
    current: Option<Document>,
    state: CursorState,
}

impl<'c> ResultCursor<'c> {
    pub(crate) fn new(container: &'c Container, results: Results) -> Self {
        Self {
            container,
            results: Some(results),
            current: None,
            state: CursorState::Active,
        }
    }

    pub fn state(&self) -> CursorState {
        self.state
    }

    pub fn is_exhausted(&self) -> bool {
        self.state == CursorState::Exhausted
    }

    /// Move to the next document. Returns false once exhausted.
    ///
    /// An engine error exhausts the cursor and is recorded on the container.
    pub fn advance(&mut self) -> Result<bool, StoreError> {
        if self.state == CursorState::Exhausted {
            return Ok(false);
        }
        self.container.begin();
        self.current = None;

        let next = match self.results.as_mut() {
            Some(results) => results.next_document(),
            None => Ok(None),
        };
        match next {
            Ok(Some(doc)) => {
                self.current = Some(doc);
                Ok(true)
            }
            Ok(None) => {
                self.exhaust();
                Ok(false)
            }
            Err(e) => {
                self.exhaust();
                self.container.record_error(&e);
                Err(e)
            }
        }
    }

    /// Name of the current document, or "" when there is none.
    pub fn name(&self) -> Result<&str, StoreError> {
        match &self.current {
            Some(doc) => doc.name(),
            None => Ok(""),
        }
    }

    /// Content of the current document, or "" when there is none.
    pub fn content(&self) -> Result<&str, StoreError> {
        match &self.current {
            Some(doc) => doc.content(),
            None => Ok(""),
        }
    }

    pub fn current(&self) -> Option<&Document> {
        self.current.as_ref()
    }

    /// Release the underlying sequence.
    pub fn close(mut self) {
        self.exhaust();
    }

    fn exhaust(&mut self) {
        self.state = CursorState::Exhausted;
        self.results = None;
        self.current = None;
    }
}

impl Iterator for ResultCursor<'_> {
    type Item = Result<Document, StoreError>;

    fn next(&mut self) -> Option<Self::Item> {
        match self.advance() {
            Ok(true) => self.current.clone().map(Ok),
            Ok(false) => None,
            Err(e) => Some(Err(e)),
        }
    }
}
