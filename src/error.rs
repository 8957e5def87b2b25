//! Failure taxonomy for a try-on attempt.
//!
//! Every backend-facing failure is classified at the generation client
//! boundary into one [`PipelineError`]. The orchestrator converts whatever
//! reaches it into a terminal `Failed` state; nothing escapes unclassified.
//!
//! | Kind | Retried | Surfaced as |
//! |---|---|---|
//! | [`ErrorKind::Decode`] | no | decoder message, verbatim |
//! | [`ErrorKind::Credential`] | no | prompt to select a key |
//! | [`ErrorKind::RateLimited`] | yes, then surfaced | "server busy" |
//! | [`ErrorKind::ContentRejected`] | no | guidance about the source photo |
//! | [`ErrorKind::GenerationFailed`] | no | suggestion to retry with a clearer photo |
//! | [`ErrorKind::Network`] | no | original message |

use crate::imaging::BackendError;
use std::fmt;
use thiserror::Error;

/// User-facing message for a throttled backend.
pub const SERVER_BUSY_MESSAGE: &str =
    "The server is busy right now. Please wait a moment and try again.";

/// User-facing message for a safety-policy rejection.
pub const CONTENT_REJECTED_MESSAGE: &str =
    "The image could not be generated because it was flagged by the safety filter. \
     Try a photo where you are wearing neutral, everyday clothing.";

/// User-facing message when the backend answered without an image.
pub const GENERATION_FAILED_MESSAGE: &str =
    "No image was generated. Please try again with a clearer, well-lit photo.";

/// User-facing message for a rejected or missing credential.
pub const CREDENTIAL_MESSAGE: &str =
    "The API key is missing or invalid. Please select a valid key and try again.";

/// Discriminant of a [`PipelineError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    Decode,
    Credential,
    RateLimited,
    ContentRejected,
    GenerationFailed,
    Network,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ErrorKind::Decode => "DecodeError",
            ErrorKind::Credential => "CredentialError",
            ErrorKind::RateLimited => "RateLimited",
            ErrorKind::ContentRejected => "ContentRejected",
            ErrorKind::GenerationFailed => "GenerationFailed",
            ErrorKind::Network => "NetworkError",
        };
        f.write_str(name)
    }
}

/// Terminal failure of one attempt. No partial result accompanies it.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PipelineError {
    #[error("Could not decode image: {0}")]
    Decode(String),
    #[error("{0}")]
    Credential(String),
    #[error("{0}")]
    RateLimited(String),
    #[error("{0}")]
    ContentRejected(String),
    #[error("{0}")]
    GenerationFailed(String),
    #[error("{0}")]
    Network(String),
}

impl PipelineError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            PipelineError::Decode(_) => ErrorKind::Decode,
            PipelineError::Credential(_) => ErrorKind::Credential,
            PipelineError::RateLimited(_) => ErrorKind::RateLimited,
            PipelineError::ContentRejected(_) => ErrorKind::ContentRejected,
            PipelineError::GenerationFailed(_) => ErrorKind::GenerationFailed,
            PipelineError::Network(_) => ErrorKind::Network,
        }
    }

    /// The human-readable part, without the kind.
    pub fn message(&self) -> &str {
        match self {
            PipelineError::Decode(m)
            | PipelineError::Credential(m)
            | PipelineError::RateLimited(m)
            | PipelineError::ContentRejected(m)
            | PipelineError::GenerationFailed(m)
            | PipelineError::Network(m) => m,
        }
    }

    pub fn credential() -> Self {
        PipelineError::Credential(CREDENTIAL_MESSAGE.to_string())
    }

    pub fn server_busy() -> Self {
        PipelineError::RateLimited(SERVER_BUSY_MESSAGE.to_string())
    }

    pub fn content_rejected() -> Self {
        PipelineError::ContentRejected(CONTENT_REJECTED_MESSAGE.to_string())
    }

    pub fn generation_failed() -> Self {
        PipelineError::GenerationFailed(GENERATION_FAILED_MESSAGE.to_string())
    }

    pub fn is_credential(&self) -> bool {
        self.kind() == ErrorKind::Credential
    }
}

impl From<BackendError> for PipelineError {
    fn from(err: BackendError) -> Self {
        PipelineError::Decode(err.to_string())
    }
}
