//! Access-mode negotiation for opening a container.

use crate::engine::AccessMode;
use crate::error::StoreError;
use tracing::warn;

/// Try read-write first, then read-only once.
///
/// When both attempts fail, the returned error is the read-only attempt's.
pub fn negotiate<T, F>(mut attempt: F) -> Result<T, StoreError>
where
    F: FnMut(AccessMode) -> Result<T, StoreError>,
{
    attempt(AccessMode::ReadWrite).or_else(|first| {
        warn!("Read-write open failed ({}), retrying read-only", first);
        attempt(AccessMode::ReadOnly)
    })
}
