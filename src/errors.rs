//! Error types for the mediapilot pipeline
//!
//! Every failure category reaches the caller as a structured value; the
//! taxonomy below distinguishes model-transport failures from extraction
//! failures from execution failures so callers can act on each.

use thiserror::Error;

/// Main error type for the media-command pipeline
#[derive(Error, Debug)]
pub enum PipelineError {
    /// The language-model call itself failed (transport/auth/quota)
    #[error("Command generation failed: {0}")]
    Generation(String),

    /// The model responded but no usable command could be parsed from it
    #[error("No valid command found in model response: {0}")]
    Extraction(String),

    /// A supplied identifier does not resolve to a known file
    #[error("Unknown file identifier: {0}")]
    Resolution(String),

    /// Operation name is not one of the supported transformations
    #[error("Unsupported operation: {0}")]
    UnsupportedOperation(String),

    /// HTTP client errors
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for pipeline operations
pub type Result<T> = std::result::Result<T, PipelineError>;

impl PipelineError {
    /// True for failures originating in the model transport, as opposed to
    /// response parsing
    pub fn is_generation(&self) -> bool {
        matches!(self, PipelineError::Generation(_))
    }

    /// True for failures parsing a command out of a model response
    pub fn is_extraction(&self) -> bool {
        matches!(self, PipelineError::Extraction(_))
    }
}
