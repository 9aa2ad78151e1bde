//! Media analysis pipeline orchestration
//!
//! Drives one upload through validation, staging, analysis, best-effort
//! copy enrichment, and cleanup. The stages run strictly in order with
//! async suspension at each provider call; enrichment depends on the
//! analysis output, so nothing fans out.
//!
//! Failure policy: only validation, staging, and analysis failures reach
//! the caller. A copy-generation failure degrades to a base result with a
//! diagnostic; a cleanup failure is logged and never replaces the primary
//! outcome. A staged file never survives the run that created it.

use std::sync::Arc;

use thiserror::Error;
use tracing::{debug, error, info, warn};

use adlens_common::{AdCopy, AnalysisDetail, AnalysisResult, MediaKind};
use adlens_providers::{AnalysisError, CopyError, CopyGenerator, MediaAnalyzer};
use adlens_staging::{MediaStager, StagedMedia, StagingError};

/// Pipeline stages, in execution order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    /// Checking the upload before anything is written
    Validating,
    /// Writing the upload to transient storage
    Staging,
    /// Calling the media-understanding provider
    Analyzing,
    /// Calling the copy-generation provider (best effort)
    Enriching,
    /// Removing the staged file
    Cleaning,
    /// Emitting the composed result or error
    Responding,
}

impl Stage {
    /// Get human-readable stage name
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::Validating => "validating",
            Self::Staging => "staging",
            Self::Analyzing => "analyzing",
            Self::Enriching => "enriching",
            Self::Cleaning => "cleaning",
            Self::Responding => "responding",
        }
    }
}

/// Pipeline errors that reach the caller
#[derive(Debug, Error)]
pub enum PipelineError {
    /// The upload was rejected before anything was staged
    #[error("{0}")]
    InputRejected(String),

    /// The upload could not be written to transient storage
    #[error("failed to stage upload: {0}")]
    Staging(#[from] StagingError),

    /// The media-understanding provider failed; fatal to the request
    #[error("media analysis failed: {0}")]
    Analysis(#[from] AnalysisError),
}

impl PipelineError {
    /// Whether the failure is the caller's fault
    #[must_use]
    pub fn is_client_error(&self) -> bool {
        matches!(self, Self::InputRejected(_))
    }
}

/// One uploaded media file, as received at the request boundary
#[derive(Debug, Clone)]
pub struct MediaUpload {
    /// Raw upload bytes
    pub bytes: Vec<u8>,
    /// Declared MIME type
    pub content_type: String,
    /// Original file name
    pub file_name: String,
}

/// Outcome of a successful pipeline run
///
/// The base analysis is always complete; `enrichment_error` carries the
/// diagnostic for a failed copy-generation step instead of letting that
/// failure cross the component boundary as an error.
#[derive(Debug)]
pub struct PipelineOutput {
    /// The composed analysis result, enrichment included when it succeeded
    pub analysis: AnalysisResult,
    /// Diagnostic from a failed enrichment step
    pub enrichment_error: Option<String>,
}

/// Drives uploads through the analysis pipeline
pub struct Pipeline {
    stager: MediaStager,
    analyzer: Arc<dyn MediaAnalyzer>,
    copywriter: Arc<dyn CopyGenerator>,
}

impl Pipeline {
    /// Create a pipeline over the given stager and providers
    #[must_use]
    pub fn new(
        stager: MediaStager,
        analyzer: Arc<dyn MediaAnalyzer>,
        copywriter: Arc<dyn CopyGenerator>,
    ) -> Self {
        Self {
            stager,
            analyzer,
            copywriter,
        }
    }

    /// Run one upload through the pipeline
    ///
    /// # Errors
    /// Returns `InputRejected` for a missing or non-media upload (nothing
    /// was staged), `Staging` if the upload cannot be written, or
    /// `Analysis` if the media-understanding provider fails. In the
    /// analysis-failure case the staged file is removed before the error
    /// is returned.
    pub async fn run(&self, upload: MediaUpload) -> Result<PipelineOutput, PipelineError> {
        if upload.bytes.is_empty() {
            return Err(PipelineError::InputRejected(
                "No media file provided".to_string(),
            ));
        }
        let kind = MediaKind::from_mime(&upload.content_type).ok_or_else(|| {
            PipelineError::InputRejected("File must be a video or image".to_string())
        })?;

        info!(
            stage = Stage::Validating.name(),
            kind = kind.as_str(),
            file = %upload.file_name,
            size = upload.bytes.len(),
            "Accepted upload"
        );

        let staged = self.stager.stage(&upload.bytes, &upload.file_name).await?;
        debug!(
            stage = Stage::Staging.name(),
            path = %staged.path().display(),
            "Upload staged"
        );

        let mut analysis = match self
            .analyzer
            .analyze(staged.path(), &upload.content_type, kind)
            .await
        {
            Ok(analysis) => analysis,
            Err(e) => {
                error!(stage = Stage::Analyzing.name(), error = %e, "Analysis failed");
                // The staged file must not outlive the failed request
                self.release(&staged).await;
                return Err(e.into());
            }
        };

        let enrichment_error = match self.enrich(&analysis).await {
            Ok(copy) => {
                analysis.copy = Some(copy);
                None
            }
            Err(e) => {
                warn!(
                    stage = Stage::Enriching.name(),
                    error = %e,
                    "Copy generation failed, returning base result"
                );
                Some(e.to_string())
            }
        };

        self.release(&staged).await;

        info!(
            stage = Stage::Responding.name(),
            kind = kind.as_str(),
            enriched = enrichment_error.is_none(),
            "Pipeline complete"
        );

        Ok(PipelineOutput {
            analysis,
            enrichment_error,
        })
    }

    /// Ask the copy generator to enrich a base analysis
    async fn enrich(&self, analysis: &AnalysisResult) -> Result<AdCopy, CopyError> {
        match &analysis.detail {
            AnalysisDetail::Video { transcript, scenes } => {
                self.copywriter
                    .generate(&analysis.description, transcript.as_deref(), scenes)
                    .await
            }
            AnalysisDetail::Image { .. } => {
                self.copywriter
                    .generate(&analysis.description, None, &[])
                    .await
            }
        }
    }

    /// Release a staged file, logging rather than surfacing failures
    async fn release(&self, staged: &StagedMedia) {
        if let Err(e) = self.stager.release(staged).await {
            warn!(
                stage = Stage::Cleaning.name(),
                path = %staged.path().display(),
                error = %e,
                "Failed to remove staged file"
            );
        }
    }
}
