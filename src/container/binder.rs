//! Query binding: scope an expression to one container and run it.

use crate::container::Container;
use crate::cursor::ResultCursor;
use crate::error::StoreError;
use crate::query::{EvaluationType, QueryContext, QueryFlags, ReturnType};
use tracing::debug;

/// Builds the query context for a container and submits expressions.
///
/// The context's default collection is always the container's alias, and
/// every expression is prefixed with `collection('<alias>')`.
pub struct QueryBinder<'c> {
    container: &'c Container,
    context: QueryContext,
    flags: QueryFlags,
}

impl<'c> QueryBinder<'c> {
    pub(crate) fn new(container: &'c Container) -> Self {
        let defaults = container.query_defaults();
        let context = QueryContext::new(defaults.return_type, defaults.evaluation);
        let flags = QueryFlags {
            lazy_docs: true,
            well_formed_only: defaults.well_formed_only,
        };
        Self::from_parts(container, context, flags)
    }

    /// Bind an explicit context; its default collection becomes the alias.
    pub(crate) fn from_parts(
        container: &'c Container,
        mut context: QueryContext,
        flags: QueryFlags,
    ) -> Self {
        context.set_default_collection(container.alias());
        Self {
            container,
            context,
            flags,
        }
    }

    pub fn return_type(mut self, return_type: ReturnType) -> Self {
        self.context.return_type = return_type;
        self
    }

    pub fn evaluation(mut self, evaluation: EvaluationType) -> Self {
        self.context.evaluation = evaluation;
        self
    }

    pub fn well_formed_only(mut self, well_formed_only: bool) -> Self {
        self.flags.well_formed_only = well_formed_only;
        self
    }

    pub fn lazy_docs(mut self, lazy_docs: bool) -> Self {
        self.flags.lazy_docs = lazy_docs;
        self
    }

    /// The full expression submitted for `expression`.
    pub fn compose(&self, expression: &str) -> String {
        format!("collection('{}'){}", self.container.alias(), expression)
    }

    /// Evaluate `expression` and return a cursor over the matching documents.
    pub fn run(self, expression: &str) -> Result<ResultCursor<'c>, StoreError> {
        self.container.begin();
        let composed = self.compose(expression);
        debug!(query = %composed, "Submitting query");
        match self
            .container
            .manager()
            .query(&composed, &self.context, self.flags)
        {
            Ok(results) => Ok(ResultCursor::new(self.container, results)),
            Err(e) => {
                self.container.record_error(&e);
                Err(e)
            }
        }
    }
}
