//! CLI output: error mapping from store errors to the CLI surface.

use crate::error::StoreError;

/// Map a store error to the line printed on stderr.
pub fn map_error(e: &StoreError) -> String {
    match e {
        StoreError::Locked(path) => format!(
            "{} (another handle in this process holds {} read-write)",
            e,
            path.display()
        ),
        StoreError::ReadOnly => format!("{} (write rejected)", e),
        _ => e.to_string(),
    }
}
