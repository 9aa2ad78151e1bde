//! Transient staging of uploaded media
//!
//! Uploaded bytes are written under a per-request, collision-resistant
//! name inside a single staging root. A staged file never outlives the
//! pipeline run that created it: the orchestrator releases it on both the
//! success and the failure path.

use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use thiserror::Error;
use tracing::debug;
use uuid::Uuid;

/// Staging errors
#[derive(Debug, Error)]
pub enum StagingError {
    #[error("staging root unavailable: {0}")]
    RootUnavailable(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for staging operations
pub type StagingResult<T> = Result<T, StagingError>;

/// Where staged files live and whether the root may be created on demand
///
/// The root is resolved once, at construction of the [`MediaStager`];
/// per-call environment branching is deliberately absent.
#[derive(Debug, Clone)]
pub struct StagingConfig {
    /// Directory that receives staged files
    pub root: PathBuf,
    /// Create the root on first use. `false` models deployment targets
    /// whose single writable root is guaranteed to exist already.
    pub ensure_root: bool,
}

impl Default for StagingConfig {
    fn default() -> Self {
        let root = std::env::var("ADLENS_STAGING_ROOT")
            .map(PathBuf::from)
            .unwrap_or_else(|_| std::env::temp_dir().join("adlens"));
        let fixed = std::env::var("ADLENS_STAGING_FIXED").is_ok_and(|v| v == "1");
        Self {
            root,
            ensure_root: !fixed,
        }
    }
}

/// Handle to a staged media file
#[derive(Debug, Clone)]
pub struct StagedMedia {
    path: PathBuf,
}

impl StagedMedia {
    /// Get the path to the staged file
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl AsRef<Path> for StagedMedia {
    fn as_ref(&self) -> &Path {
        &self.path
    }
}

/// Stages upload bytes to disk for the duration of one pipeline run
pub struct MediaStager {
    root: PathBuf,
    ensure_root: bool,
}

impl MediaStager {
    /// Create a stager rooted at the configured directory
    #[must_use]
    pub fn new(config: StagingConfig) -> Self {
        Self {
            root: config.root,
            ensure_root: config.ensure_root,
        }
    }

    /// The staging root this stager writes into
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Write `bytes` to a freshly named file under the staging root
    ///
    /// The staged name combines a millisecond timestamp, a random
    /// component, and the (sanitized) client-supplied name, so concurrent
    /// requests never collide.
    ///
    /// # Errors
    /// Returns `RootUnavailable` if the root is missing and cannot be
    /// created, or an `Io` error if the write itself fails.
    pub async fn stage(&self, bytes: &[u8], suggested_name: &str) -> StagingResult<StagedMedia> {
        if self.ensure_root && !self.root.exists() {
            tokio::fs::create_dir_all(&self.root).await.map_err(|e| {
                StagingError::RootUnavailable(format!("{}: {e}", self.root.display()))
            })?;
        }

        let millis = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or(Duration::from_secs(0))
            .as_millis();
        let file_name = format!(
            "{millis}-{}-{}",
            Uuid::new_v4(),
            sanitize_name(suggested_name)
        );
        let path = self.root.join(file_name);

        tokio::fs::write(&path, bytes).await?;
        debug!("Staged {} bytes to {}", bytes.len(), path.display());

        Ok(StagedMedia { path })
    }

    /// Remove a staged file
    ///
    /// Idempotent: a file that is already gone is not an error. Other I/O
    /// failures are returned for the caller to log; they are never meant
    /// to replace the primary outcome being reported.
    ///
    /// # Errors
    /// Returns an `Io` error if removal fails for a reason other than the
    /// file being absent.
    pub async fn release(&self, staged: &StagedMedia) -> StagingResult<()> {
        match tokio::fs::remove_file(&staged.path).await {
            Ok(()) => {
                debug!("Released staged file {}", staged.path.display());
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    /// Whether the staged file is still present
    pub async fn is_staged(&self, staged: &StagedMedia) -> bool {
        tokio::fs::try_exists(&staged.path).await.unwrap_or(false)
    }
}

/// Strip path components from a client-supplied file name
fn sanitize_name(name: &str) -> String {
    let base = name.rsplit(['/', '\\']).next().unwrap_or(name).trim();
    if base.is_empty() {
        "upload".to_string()
    } else {
        base.to_string()
    }
}
