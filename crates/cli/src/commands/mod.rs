//! CLI command implementations

use std::path::PathBuf;
use std::sync::Arc;

use adlens_storage::{FileSlot, ResultStore};

pub mod analyze;
pub mod results;

/// Open the result store at its configured slot path
pub fn open_store() -> ResultStore {
    ResultStore::new(Arc::new(FileSlot::new(results_path())))
}

/// Resolve where saved results live
///
/// `ADLENS_RESULTS_PATH` wins; otherwise the store sits in the user's data
/// directory, falling back to the working directory when there is no home.
fn results_path() -> PathBuf {
    if let Ok(path) = std::env::var("ADLENS_RESULTS_PATH") {
        return PathBuf::from(path);
    }
    match std::env::var("HOME") {
        Ok(home) => PathBuf::from(home)
            .join(".local")
            .join("share")
            .join("adlens")
            .join("results.json"),
        Err(_) => PathBuf::from("adlens-results.json"),
    }
}
