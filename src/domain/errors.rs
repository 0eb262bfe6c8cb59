//! Domain errors for the selfheal remediation system.

use thiserror::Error;

/// Domain-level errors that can occur while running a remediation.
#[derive(Debug, Error)]
pub enum DomainError {
    #[error("Invariant violated: {0}")]
    InvariantViolated(String),

    #[error("Invalid stage transition from {from} to {to}")]
    InvalidTransition { from: String, to: String },

    #[error("Session not found: {0}")]
    SessionNotFound(String),

    #[error("Source unavailable: {0}")]
    SourceUnavailable(String),

    #[error("Checkpoint error: {0}")]
    Checkpoint(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),

    #[error("Execution failed: {0}")]
    ExecutionFailed(String),
}

pub type DomainResult<T> = Result<T, DomainError>;

impl From<serde_json::Error> for DomainError {
    fn from(err: serde_json::Error) -> Self {
        DomainError::SerializationError(err.to_string())
    }
}

/// Failure of an external collaborator call (model, log source, publisher).
///
/// Transient variants are retried by [`RetryPolicy`](crate::infrastructure::retry::RetryPolicy);
/// everything else surfaces immediately and the calling stage degrades to a negative outcome.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CollaboratorError {
    /// Too many requests, retry after waiting
    #[error("Rate limit exceeded: {0}")]
    RateLimited(String),

    /// Remote service returned a 5xx or reported overload
    #[error("Service unavailable: {0}")]
    Unavailable(String),

    /// Connection-level failure
    #[error("Network error: {0}")]
    Network(String),

    /// Request timed out waiting for response
    #[error("Timeout waiting for response")]
    Timeout,

    /// Credentials rejected
    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    /// Remote rejected the request as malformed or the resource does not exist
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Remote answered but the payload could not be understood
    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    /// Local I/O failure inside an adapter
    #[error("I/O error: {0}")]
    Io(String),
}

impl CollaboratorError {
    /// Returns true if this error is transient and should be retried
    ///
    /// ```
    /// use selfheal::domain::errors::CollaboratorError;
    ///
    /// assert!(CollaboratorError::Timeout.is_transient());
    /// assert!(!CollaboratorError::AuthenticationFailed("bad key".into()).is_transient());
    /// ```
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            CollaboratorError::RateLimited(_)
                | CollaboratorError::Unavailable(_)
                | CollaboratorError::Network(_)
                | CollaboratorError::Timeout
        )
    }

    /// Map an HTTP status and response body to an error variant.
    ///
    /// - 400, 404, 422: invalid request
    /// - 401, 403: authentication failed
    /// - 429: rate limited
    /// - 5xx, 529: unavailable
    pub fn from_status(status: reqwest::StatusCode, body: String) -> Self {
        match status.as_u16() {
            401 | 403 => CollaboratorError::AuthenticationFailed(body),
            429 => CollaboratorError::RateLimited(body),
            500..=599 => CollaboratorError::Unavailable(format!("HTTP {status}: {body}")),
            _ => CollaboratorError::InvalidRequest(format!("HTTP {status}: {body}")),
        }
    }
}

impl From<reqwest::Error> for CollaboratorError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            CollaboratorError::Timeout
        } else if err.is_decode() {
            CollaboratorError::MalformedResponse(err.to_string())
        } else if let Some(status) = err.status() {
            CollaboratorError::from_status(status, err.to_string())
        } else {
            CollaboratorError::Network(err.to_string())
        }
    }
}

impl From<std::io::Error> for CollaboratorError {
    fn from(err: std::io::Error) -> Self {
        CollaboratorError::Io(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::StatusCode;

    #[test]
    fn test_transient_classification() {
        assert!(CollaboratorError::RateLimited("slow down".into()).is_transient());
        assert!(CollaboratorError::Unavailable("503".into()).is_transient());
        assert!(CollaboratorError::Network("reset".into()).is_transient());
        assert!(CollaboratorError::Timeout.is_transient());

        assert!(!CollaboratorError::AuthenticationFailed("401".into()).is_transient());
        assert!(!CollaboratorError::InvalidRequest("400".into()).is_transient());
        assert!(!CollaboratorError::MalformedResponse("{".into()).is_transient());
        assert!(!CollaboratorError::Io("denied".into()).is_transient());
    }

    #[test]
    fn test_from_status() {
        assert!(matches!(
            CollaboratorError::from_status(StatusCode::TOO_MANY_REQUESTS, String::new()),
            CollaboratorError::RateLimited(_)
        ));
        assert!(matches!(
            CollaboratorError::from_status(StatusCode::UNAUTHORIZED, String::new()),
            CollaboratorError::AuthenticationFailed(_)
        ));
        assert!(matches!(
            CollaboratorError::from_status(StatusCode::FORBIDDEN, String::new()),
            CollaboratorError::AuthenticationFailed(_)
        ));
        assert!(matches!(
            CollaboratorError::from_status(StatusCode::BAD_GATEWAY, String::new()),
            CollaboratorError::Unavailable(_)
        ));
        assert!(matches!(
            CollaboratorError::from_status(StatusCode::from_u16(529).unwrap(), String::new()),
            CollaboratorError::Unavailable(_)
        ));
        assert!(matches!(
            CollaboratorError::from_status(StatusCode::NOT_FOUND, String::new()),
            CollaboratorError::InvalidRequest(_)
        ));
    }

    #[test]
    fn test_domain_error_display() {
        let err = DomainError::InvalidTransition {
            from: "fixing".into(),
            to: "publishing".into(),
        };
        assert_eq!(err.to_string(), "Invalid stage transition from fixing to publishing");
    }
}
