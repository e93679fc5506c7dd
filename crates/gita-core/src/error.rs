//! Error types for explanation requests and share exports.

use thiserror::Error;

use crate::provider::Provider;

/// Everything that can go wrong while fetching an explanation.
///
/// Callers show a single apology for all of these; the variant only matters
/// for diagnostics.
#[derive(Debug, Error)]
pub enum ExplainError {
    /// The request never produced an HTTP response.
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// The backend answered with a non-success status.
    #[error("{provider} API error {status}: {body}")]
    Status {
        provider: Provider,
        status: u16,
        body: String,
    },

    /// The backend answered but produced no text.
    #[error("no content generated")]
    EmptyContent,

    /// The generated text is not valid JSON for the explanation schema.
    #[error("could not parse explanation: {0}")]
    Parse(#[from] serde_json::Error),

    /// The generated JSON lacks a required field, or the field is blank.
    #[error("explanation is missing required field `{0}`")]
    MissingField(&'static str),

    /// No API key is configured for a provider that needs one.
    #[error("no API key configured for {0}")]
    MissingCredential(Provider),

    /// The task running the request panicked or was cancelled.
    #[error("explanation task did not complete: {0}")]
    Interrupted(String),
}

impl ExplainError {
    /// Short category name used in log lines.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Transport(_)
            | Self::Status { .. }
            | Self::MissingCredential(_)
            | Self::Interrupted(_) => "backend",
            Self::EmptyContent => "empty-content",
            Self::Parse(_) | Self::MissingField(_) => "parse",
        }
    }
}

/// Failures while rendering or handing off a share card.
#[derive(Debug, Error)]
pub enum ShareError {
    /// No font able to draw the card could be loaded.
    #[error("no usable font found for the share card")]
    FontUnavailable,

    #[error("failed to encode PNG: {0}")]
    Encode(#[from] image::ImageError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The configured share command exited unsuccessfully.
    #[error("share command `{command}` failed with {status}")]
    ShareCommand { command: String, status: String },
}
