//! Shared data model for the adlens media pipeline
//!
//! Defines the media kind discriminator and the analysis result types that
//! flow from the providers through the orchestrator to the HTTP boundary
//! and the result store. Wire names are camelCase to stay compatible with
//! the persisted JSON schema.

use serde::{Deserialize, Serialize};

/// Media kind accepted by the pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Video,
    Image,
}

impl MediaKind {
    /// Determine the media kind from a declared MIME type.
    ///
    /// Only `video/*` and `image/*` map to a kind; anything else is `None`.
    /// Parameters after a `;` are ignored.
    #[must_use]
    pub fn from_mime(mime: &str) -> Option<Self> {
        let lower = mime.to_lowercase();
        let base = lower.split(';').next().unwrap_or("").trim();
        if base.starts_with("video/") {
            Some(Self::Video)
        } else if base.starts_with("image/") {
            Some(Self::Image)
        } else {
            None
        }
    }

    /// Get human-readable kind name
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Video => "video",
            Self::Image => "image",
        }
    }
}

impl std::fmt::Display for MediaKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.pad(self.as_str())
    }
}

/// Generated ad copy attached to a result by the copy-generation step
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdCopy {
    /// Short attention-grabbing headline
    pub headline: String,
    /// One or two sentences of marketing copy
    pub description: String,
}

/// Kind-specific analysis fields, tagged by `kind`
///
/// The tag is fixed when the variant is constructed; consumers never infer
/// the kind from which optional fields happen to be present.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum AnalysisDetail {
    /// Video analysis fields
    Video {
        /// Spoken-word transcript, when the provider could produce one
        #[serde(default, skip_serializing_if = "Option::is_none")]
        transcript: Option<String>,
        /// Ordered scene-by-scene summaries
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        scenes: Vec<String>,
    },
    /// Image analysis fields
    Image {
        /// Suggested ad copy lines read off the image
        #[serde(default, skip_serializing_if = "Option::is_none", rename = "adCopy")]
        ad_copy: Option<Vec<String>>,
        /// Notable visual elements
        #[serde(
            default,
            skip_serializing_if = "Option::is_none",
            rename = "visualElements"
        )]
        visual_elements: Option<Vec<String>>,
    },
}

/// Result of analyzing one uploaded media file
///
/// `copy` is the optional enrichment produced by the copy-generation
/// provider after the base analysis; its absence is a valid, non-error
/// state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    /// Provider-produced description of the media
    pub description: String,
    /// Kind-specific fields, tagged by `kind`
    #[serde(flatten)]
    pub detail: AnalysisDetail,
    /// Generated ad copy enrichment
    #[serde(default, skip_serializing_if = "Option::is_none", rename = "copyResult")]
    pub copy: Option<AdCopy>,
}

impl AnalysisResult {
    /// Create a base video result (no enrichment)
    #[must_use]
    pub fn video(description: String, transcript: Option<String>, scenes: Vec<String>) -> Self {
        Self {
            description,
            detail: AnalysisDetail::Video { transcript, scenes },
            copy: None,
        }
    }

    /// Create a base image result (no enrichment)
    #[must_use]
    pub fn image(
        description: String,
        ad_copy: Option<Vec<String>>,
        visual_elements: Option<Vec<String>>,
    ) -> Self {
        Self {
            description,
            detail: AnalysisDetail::Image {
                ad_copy,
                visual_elements,
            },
            copy: None,
        }
    }

    /// The media kind this result describes
    #[must_use]
    pub fn kind(&self) -> MediaKind {
        match self.detail {
            AnalysisDetail::Video { .. } => MediaKind::Video,
            AnalysisDetail::Image { .. } => MediaKind::Image,
        }
    }
}
