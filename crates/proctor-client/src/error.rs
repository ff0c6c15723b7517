//! Backend client error types.

use thiserror::Error;

/// Errors that can occur when talking to an exam backend.
#[derive(Debug, Error)]
pub enum ClientError {
    /// The backend answered with `success: false`.
    #[error("request rejected: {0}")]
    Rejected(String),

    /// The backend returned a non-success HTTP status.
    #[error("API error (HTTP {status}): {message}")]
    Api { status: u16, message: String },

    /// The request timed out.
    #[error("request timed out after {0}s")]
    Timeout(u64),

    /// A network error occurred.
    #[error("network error: {0}")]
    Network(String),

    /// The response body could not be decoded.
    #[error("malformed response: {0}")]
    Malformed(String),

    /// A requested exam does not exist.
    #[error("exam not found: {0}")]
    ExamNotFound(String),
}
