//! Session error types.
//!
//! Parsing code (segmenter, tokenizer, key parsing) never fails; these errors
//! cover the places where the session itself refuses an operation, so the
//! lifecycle driver can classify them without string matching.

use thiserror::Error;

/// Errors raised by the session state or lifecycle driver.
#[derive(Debug, Error)]
pub enum SessionError {
    /// The exam or session could not be obtained from the API.
    #[error("exam {exam_id} could not be loaded: {message}")]
    ExamUnavailable { exam_id: String, message: String },

    /// The session-start call failed.
    #[error("session for exam {exam_id} could not be started: {message}")]
    StartFailed { exam_id: String, message: String },

    /// Submission was rejected or never reached the server.
    #[error("submission failed: {0}")]
    SubmitFailed(String),

    /// An input addressed a question id that is not part of the exam.
    #[error("unknown question: {0}")]
    UnknownQuestion(String),

    /// The session has already been submitted and accepts no more input.
    #[error("session {0} is already submitted")]
    AlreadySubmitted(String),

    /// A submission is already in flight.
    #[error("a submission is already in progress")]
    SubmitInProgress,

    /// A routing URL could not be interpreted.
    #[error("invalid session route: {0}")]
    InvalidRoute(String),
}

impl SessionError {
    /// Returns `true` if the session can keep going after this error.
    ///
    /// Submission failures leave answers and timer live so the user can retry.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            SessionError::SubmitFailed(_)
                | SessionError::UnknownQuestion(_)
                | SessionError::SubmitInProgress
        )
    }
}
