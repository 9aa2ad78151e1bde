//! Result store for completed media analyses
//!
//! Persists the results a caller wants to keep, keyed and typed by media
//! kind, in a single named slot holding the whole collection as JSON. The
//! backing medium is behind the narrow [`ResultSlot`] trait so it can be
//! swapped (file, memory) without touching the store logic.
//!
//! Every mutation reads, modifies, and rewrites the entire collection.
//! There is no concurrent-writer protocol: two writers racing on the same
//! slot are last-writer-wins, an accepted limitation rather than a
//! guarantee. Read failures degrade to an empty collection; write
//! failures are logged and the write is dropped.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{error, warn};
use uuid::Uuid;

use adlens_common::{AnalysisResult, MediaKind};

pub mod slot;

pub use slot::{FileSlot, MemorySlot, ResultSlot};

/// Storage layer errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("backing store unavailable: {0}")]
    Unavailable(String),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// A persisted analysis result plus storage metadata
///
/// Immutable after construction; records are only ever removed wholesale.
/// The flattened analysis carries the `kind` tag, so the discriminator
/// always matches the populated variant fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SavedResult {
    /// Unique record id
    pub id: String,
    /// Creation time, milliseconds since the Unix epoch
    pub created_at: i64,
    /// Name of the uploaded file this result came from
    pub source_file_name: String,
    /// The analysis itself
    #[serde(flatten)]
    pub analysis: AnalysisResult,
}

impl SavedResult {
    /// The media kind this record holds
    #[must_use]
    pub fn kind(&self) -> MediaKind {
        self.analysis.kind()
    }
}

/// Client-resident store of completed analysis results
pub struct ResultStore {
    slot: Arc<dyn ResultSlot>,
}

impl ResultStore {
    /// Create a store over the given slot
    #[must_use]
    pub fn new(slot: Arc<dyn ResultSlot>) -> Self {
        Self { slot }
    }

    /// Persist a new result and return the stored record
    ///
    /// Assigns the record id and creation time; the kind comes from the
    /// result itself and is never re-inferred. A failed write is logged
    /// and dropped — the returned record is still valid in memory, and
    /// the in-memory view may disagree with persisted state until the
    /// next reload.
    pub async fn insert(&self, analysis: AnalysisResult, source_file_name: &str) -> SavedResult {
        let created_at = chrono::Utc::now().timestamp_millis();
        // Timestamp plus filename alone can collide inside one millisecond
        // tick; the random component keeps ids unique regardless.
        let id = format!("{created_at}-{}-{source_file_name}", Uuid::new_v4());

        let saved = SavedResult {
            id,
            created_at,
            source_file_name: source_file_name.to_string(),
            analysis,
        };

        let mut results = self.list_all().await;
        results.insert(0, saved.clone());
        self.persist(&results).await;

        saved
    }

    /// All saved results, newest first
    ///
    /// Sorting is recomputed on every read; the order records happen to
    /// sit in inside the slot is irrelevant. An unreadable or corrupt
    /// slot degrades to an empty collection with a diagnostic.
    pub async fn list_all(&self) -> Vec<SavedResult> {
        let raw = match self.slot.read().await {
            Ok(Some(raw)) => raw,
            Ok(None) => return Vec::new(),
            Err(e) => {
                warn!("Failed to read result store: {e}");
                return Vec::new();
            }
        };

        let mut results: Vec<SavedResult> = match serde_json::from_slice(&raw) {
            Ok(results) => results,
            Err(e) => {
                warn!("Corrupt result store, treating as empty: {e}");
                return Vec::new();
            }
        };

        results.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        results
    }

    /// Delete one record by id
    ///
    /// Idempotent: an absent id leaves the collection unchanged and is
    /// not an error.
    pub async fn delete_by_id(&self, id: &str) {
        let mut results = self.list_all().await;
        if let Some(idx) = results.iter().position(|r| r.id == id) {
            results.remove(idx);
            self.persist(&results).await;
        }
    }

    /// Remove all saved results
    pub async fn clear(&self) {
        if let Err(e) = self.slot.clear().await {
            warn!("Failed to clear result store: {e}");
        }
    }

    /// Write the whole collection back to the slot, dropping on failure
    async fn persist(&self, results: &[SavedResult]) {
        let json = match serde_json::to_vec(results) {
            Ok(json) => json,
            Err(e) => {
                error!("Failed to serialize result store, dropping write: {e}");
                return;
            }
        };
        if let Err(e) = self.slot.write(&json).await {
            error!("Failed to persist result store, dropping write: {e}");
        }
    }
}
