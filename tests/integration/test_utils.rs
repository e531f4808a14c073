//! Shared test utilities for integration tests
//!
//! Serializes access to process environment variables so config tests can
//! point XDG_CONFIG_HOME and DOCSTORE__* at temporary values.

use std::sync::Mutex;
use tempfile::TempDir;

/// Global mutex to serialize environment variable access across all tests
static ENV_MUTEX: Mutex<()> = Mutex::new(());

/// Run `f` with XDG_CONFIG_HOME pointed at a fresh temp dir and `vars` set.
///
/// Every variable touched is restored afterwards, even if `f` panics.
pub fn with_isolated_env<F, R>(vars: &[(&str, &str)], f: F) -> R
where
    F: FnOnce(&TempDir) -> R,
{
    let _lock = ENV_MUTEX.lock().unwrap_or_else(|e| e.into_inner());
    let temp_dir = TempDir::new().unwrap();

    let mut touched: Vec<(String, Option<String>)> = vec![(
        "XDG_CONFIG_HOME".to_string(),
        std::env::var("XDG_CONFIG_HOME").ok(),
    )];
    std::env::set_var("XDG_CONFIG_HOME", temp_dir.path().join("config"));
    for (key, value) in vars {
        touched.push((key.to_string(), std::env::var(key).ok()));
        std::env::set_var(key, value);
    }

    let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| f(&temp_dir)));

    for (key, original) in touched.into_iter().rev() {
        match original {
            Some(value) => std::env::set_var(&key, value),
            None => std::env::remove_var(&key),
        }
    }

    match result {
        Ok(value) => value,
        Err(panic) => std::panic::resume_unwind(panic),
    }
}

/// A small catalogue used by the query and cursor tests.
pub const BOOKS: [(&str, &str); 3] = [
    (
        "dune",
        "<book lang=\"en\"><title>Dune</title><author>Herbert</author><year>1965</year></book>",
    ),
    (
        "neuromancer",
        "<book lang=\"en\"><title>Neuromancer</title><author>Gibson</author><year>1984</year></book>",
    ),
    (
        "solaris",
        "<book lang=\"pl\"><title>Solaris</title><author>Lem</author><year>1961</year></book>",
    ),
];
