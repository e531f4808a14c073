//! Query contexts and compiled queries
//!
//! Queries are written in a practical XPath 1.0 subset. A query names the
//! collection it runs against with `collection('alias')` (or `collection()`
//! for the context's default collection) and selects the documents for
//! which the whole expression matches.

pub mod eval;
pub mod lexer;
pub mod parser;

use crate::error::StoreError;
use parser::Expr;
use roxmltree::ParsingOptions;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// How result values are handed to the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReturnType {
    /// Documents are decoded on first access by the caller
    #[default]
    LiveValues,
    /// Documents are decoded as soon as they are yielded
    DeadValues,
}

/// When the query is evaluated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EvaluationType {
    /// One document at a time, as the cursor advances
    #[default]
    Lazy,
    /// Every document before the cursor is returned
    Eager,
}

/// Options for evaluating a query.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryContext {
    pub return_type: ReturnType,
    pub evaluation: EvaluationType,
    default_collection: Option<String>,
}

impl QueryContext {
    pub fn new(return_type: ReturnType, evaluation: EvaluationType) -> Self {
        Self {
            return_type,
            evaluation,
            default_collection: None,
        }
    }

    /// Set the collection used by `collection()` and by expressions that name
    /// no collection at all.
    pub fn set_default_collection(&mut self, alias: impl Into<String>) {
        self.default_collection = Some(alias.into());
    }

    pub fn default_collection(&self) -> Option<&str> {
        self.default_collection.as_deref()
    }
}

/// Flags for document delivery.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueryFlags {
    /// Fetch documents one at a time from storage
    pub lazy_docs: bool,
    /// Check documents for well-formedness only; a stored document that does
    /// not parse is skipped instead of failing the query
    pub well_formed_only: bool,
}

impl Default for QueryFlags {
    fn default() -> Self {
        Self {
            lazy_docs: true,
            well_formed_only: false,
        }
    }
}

/// A parsed query bound to the collection it reads from.
#[derive(Debug, Clone)]
pub struct CompiledQuery {
    collection: String,
    expr: Expr,
}

impl CompiledQuery {
    pub fn compile(expression: &str, context: &QueryContext) -> Result<Self, StoreError> {
        let expr = parser::parse(expression)?;

        let mut named: Option<String> = None;
        for reference in parser::collection_refs(&expr) {
            let alias = match reference {
                Some(alias) => alias,
                None => context.default_collection().map(str::to_string).ok_or_else(|| {
                    StoreError::QueryFailure("No default collection is set".to_string())
                })?,
            };
            match &named {
                Some(existing) if *existing != alias => {
                    return Err(StoreError::QueryFailure(format!(
                        "A query may read one collection, found '{}' and '{}'",
                        existing, alias
                    )));
                }
                Some(_) => {}
                None => named = Some(alias),
            }
        }

        let collection = match named {
            Some(alias) => alias,
            None => context.default_collection().map(str::to_string).ok_or_else(|| {
                StoreError::QueryFailure("Query names no collection".to_string())
            })?,
        };

        Ok(Self { collection, expr })
    }

    pub fn collection(&self) -> &str {
        &self.collection
    }

    /// Evaluate against one document's content.
    ///
    /// Internal DTD subsets are read for entities; nothing is validated.
    /// Returns `None` when the document does not parse and the query runs
    /// `well_formed_only`.
    pub fn matches(&self, content: &str, flags: QueryFlags) -> Result<Option<bool>, StoreError> {
        let mut options = ParsingOptions::default();
        options.allow_dtd = true;
        let doc = match roxmltree::Document::parse_with_options(content, options) {
            Ok(doc) => doc,
            Err(e) if flags.well_formed_only => {
                debug!("Skipping document that is not well-formed: {}", e);
                return Ok(None);
            }
            Err(e) => {
                return Err(StoreError::QueryFailure(format!(
                    "Stored document could not be parsed: {}",
                    e
                )))
            }
        };
        eval::matches(&self.expr, &doc).map(Some)
    }
}
