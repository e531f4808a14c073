//! Engine-level document sequences

use crate::engine::document::Document;
use crate::error::StoreError;
use crate::query::{CompiledQuery, QueryFlags, ReturnType};

enum Source {
    /// Every document, straight from storage
    All(sled::Iter),
    /// Documents from storage that satisfy a query
    Filtered {
        iter: sled::Iter,
        query: CompiledQuery,
        flags: QueryFlags,
    },
    /// A sequence that was evaluated up front
    Materialized(std::vec::IntoIter<Document>),
}

/// A single-pass sequence of documents.
///
/// Records are pulled from storage as the sequence is consumed; nothing is
/// read ahead unless the sequence was made eager.
pub struct Results {
    source: Source,
    return_type: ReturnType,
}

impl Results {
    pub(crate) fn all(iter: sled::Iter) -> Self {
        Self {
            source: Source::All(iter),
            return_type: ReturnType::LiveValues,
        }
    }

    pub(crate) fn filtered(
        iter: sled::Iter,
        query: CompiledQuery,
        flags: QueryFlags,
        return_type: ReturnType,
    ) -> Self {
        Self {
            source: Source::Filtered { iter, query, flags },
            return_type,
        }
    }

    /// Drain the remaining documents now and keep them in memory.
    pub(crate) fn into_eager(mut self) -> Result<Self, StoreError> {
        let mut documents = Vec::new();
        while let Some(doc) = self.next_document()? {
            documents.push(doc);
        }
        Ok(Self {
            source: Source::Materialized(documents.into_iter()),
            return_type: self.return_type,
        })
    }

    /// Pull the next document, or `None` once the sequence is exhausted.
    pub fn next_document(&mut self) -> Result<Option<Document>, StoreError> {
        let doc = match &mut self.source {
            Source::All(iter) => match iter.next() {
                Some(entry) => {
                    let (key, raw) = entry?;
                    Some(Document::from_raw(key, raw))
                }
                None => None,
            },
            Source::Filtered { iter, query, flags } => loop {
                let Some(entry) = iter.next() else {
                    break None;
                };
                let (key, raw) = entry?;
                let doc = Document::from_raw(key, raw);
                if query.matches(doc.content()?, *flags)? == Some(true) {
                    break Some(doc);
                }
            },
            Source::Materialized(documents) => documents.next(),
        };

        if let (Some(doc), ReturnType::DeadValues) = (&doc, self.return_type) {
            doc.materialize()?;
        }
        Ok(doc)
    }
}

impl Iterator for Results {
    type Item = Result<Document, StoreError>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_document().transpose()
    }
}
