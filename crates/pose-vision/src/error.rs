//! Error types for collaborator-facing vision operations.
//!
//! The numeric core never fails: malformed poses yield `None` or `0.0`.
//! These errors only describe failures of the external frame sampler and
//! landmark extractor.

use std::path::PathBuf;
use thiserror::Error;

/// Result type for vision operations.
pub type VisionResult<T> = Result<T, VisionError>;

/// Errors raised by the frame sampler or landmark extractor.
#[derive(Debug, Error)]
pub enum VisionError {
    #[error("Source not found: {0}")]
    SourceNotFound(PathBuf),

    #[error("Frame sampling failed: {message}")]
    SamplingFailed { message: String },

    #[error("Landmark extraction failed: {message}")]
    ExtractionFailed { message: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl VisionError {
    pub fn sampling_failed(message: impl Into<String>) -> Self {
        Self::SamplingFailed {
            message: message.into(),
        }
    }

    pub fn extraction_failed(message: impl Into<String>) -> Self {
        Self::ExtractionFailed {
            message: message.into(),
        }
    }
}
