//! Per-handle record of the most recent operation's outcome.

use crate::error::StoreError;

/// Flag and message describing the last operation on a container.
///
/// Cleared at the start of every operation; set when that operation fails.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ErrorState {
    failed: bool,
    message: String,
}

impl ErrorState {
    pub fn is_error(&self) -> bool {
        self.failed
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub(crate) fn reset(&mut self) {
        self.failed = false;
        self.message.clear();
    }

    pub(crate) fn record(&mut self, error: &StoreError) {
        self.failed = true;
        self.message = error.to_string();
    }

    /// Mirror a result into the state and hand it back unchanged.
    pub(crate) fn observe<T>(&mut self, result: Result<T, StoreError>) -> Result<T, StoreError> {
        match &result {
            Ok(_) => self.reset(),
            Err(e) => self.record(e),
        }
        result
    }
}
