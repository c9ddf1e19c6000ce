//! Client error types.

use thiserror::Error;

/// Errors that can occur when talking to the exam service.
#[derive(Debug, Error)]
pub enum ClientError {
    /// The exam or session does not exist (HTTP 404).
    #[error("not found: {0}")]
    NotFound(String),

    /// The token was missing, expired or not allowed to see this exam.
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// The server rejected the request body.
    #[error("rejected (HTTP {status}): {message}")]
    Rejected { status: u16, message: String },

    /// The server failed.
    #[error("server error (HTTP {status}): {message}")]
    Server { status: u16, message: String },

    /// The response body did not match the expected shape.
    #[error("malformed response: {0}")]
    Malformed(String),

    /// The request timed out.
    #[error("request timed out after {0}s")]
    Timeout(u64),

    /// A network error occurred.
    #[error("network error: {0}")]
    Network(String),
}

impl ClientError {
    pub(crate) fn from_status(status: u16, message: String) -> Self {
        match status {
            401 | 403 => ClientError::Unauthorized(message),
            404 => ClientError::NotFound(message),
            400..=499 => ClientError::Rejected { status, message },
            _ => ClientError::Server { status, message },
        }
    }

    /// Retrying the same request cannot succeed.
    pub fn is_permanent(&self) -> bool {
        matches!(
            self,
            ClientError::NotFound(_)
                | ClientError::Unauthorized(_)
                | ClientError::Rejected { .. }
                | ClientError::Malformed(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_classification() {
        assert!(matches!(
            ClientError::from_status(404, String::new()),
            ClientError::NotFound(_)
        ));
        assert!(ClientError::from_status(403, String::new()).is_permanent());
        assert!(ClientError::from_status(422, String::new()).is_permanent());
        assert!(!ClientError::from_status(503, String::new()).is_permanent());
        assert!(!ClientError::Timeout(30).is_permanent());
    }
}
