//! Remote AI provider adapters
//!
//! Uniform interfaces to the two external services the pipeline depends
//! on:
//! - [`MediaAnalyzer`]: the primary media-understanding service that turns
//!   a staged video or image into a structured description
//! - [`CopyGenerator`]: the secondary text-generation service that turns a
//!   description into headline/description ad copy
//!
//! Both are opaque remote calls; their protocols live entirely inside this
//! crate.

mod analysis;
mod copywriting;

pub use analysis::{AnalysisError, GeminiAnalyzer, MediaAnalyzer, DEFAULT_GEMINI_MODEL};
pub use copywriting::{ClaudeCopyGenerator, CopyError, CopyGenerator, DEFAULT_ANTHROPIC_MODEL};
