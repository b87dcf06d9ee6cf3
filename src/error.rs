// Typed errors with thiserror. Surface meaningful messages to JS.
// See DESIGN.md: Error Handling

use thiserror::Error;

/// Controller error types.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum LandingError {
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Submission service unavailable: {0}")]
    ServiceUnavailable(String),

    /// The service answered, but with `success: false`.
    #[error("{0}")]
    SubmissionRejected(String),

    #[error("Submission failed: {0}")]
    SubmissionFailed(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("DOM error on {target}: {message}")]
    Dom { target: String, message: String },
}

impl From<serde_json::Error> for LandingError {
    fn from(err: serde_json::Error) -> Self {
        LandingError::Serialization(err.to_string())
    }
}
