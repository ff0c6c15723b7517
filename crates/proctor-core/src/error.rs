//! Session error types.
//!
//! Navigation mistakes are never errors (they are silent no-ops); these
//! cover lifecycle actions taken out of order and failures at the backend
//! boundary.

use thiserror::Error;

use crate::session::Phase;

/// Errors raised by the session controller.
#[derive(Debug, Error)]
pub enum SessionError {
    /// The exam has no questions, so no session can be built over it.
    #[error("exam '{0}' has no questions")]
    EmptyExam(String),

    /// A lifecycle action was attempted in the wrong phase.
    #[error("cannot {action} while {phase}")]
    InvalidPhase { action: &'static str, phase: Phase },

    /// Manual submit is only enabled on the last question.
    #[error("submit is only available on the last question")]
    SubmitNotAllowed,

    /// A report is already being persisted.
    #[error("a submission is already in flight")]
    SubmissionInFlight,

    /// There is no scored result waiting to be persisted.
    #[error("no pending submission to retry")]
    NothingToRetry,

    /// The backend did not accept the report. The score is kept for a retry.
    #[error("submission failed: {0}")]
    SubmissionFailed(String),
}

impl SessionError {
    /// Returns `true` if the same report may be sent again.
    pub fn is_retryable(&self) -> bool {
        matches!(self, SessionError::SubmissionFailed(_))
    }
}
