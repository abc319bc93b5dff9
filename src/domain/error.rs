//! # Error Classification
//!
//! Every external call returns an `ApiResult` carrying a classified failure
//! instead of raising raw transport errors across component boundaries.
//! The formatter is the only place these kinds become user-visible text.

use std::time::Duration;
use thiserror::Error;

pub type ApiResult<T> = Result<T, ApiError>;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ApiError {
    /// Network/connection failure or 5xx from the remote service. Retryable.
    #[error("transport failure: {0}")]
    Transport(String),

    /// The service asked us to back off (429). Retryable after the
    /// indicated delay, when one was given.
    #[error("rate limited")]
    RateLimited { retry_after: Option<Duration> },

    /// Malformed request or argument (4xx). Not retryable.
    #[error("client error: {0}")]
    Client(String),

    /// The service answered with a payload we could not parse. Not retryable.
    #[error("malformed response: {0}")]
    MalformedResponse(String),

    /// Retries exhausted.
    #[error("service unavailable")]
    ServiceUnavailable,
}

impl ApiError {
    pub fn is_retryable(&self) -> bool {
        matches!(self, ApiError::Transport(_) | ApiError::RateLimited { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retryable_classification() {
        assert!(ApiError::Transport("connection refused".into()).is_retryable());
        assert!(ApiError::RateLimited { retry_after: None }.is_retryable());

        assert!(!ApiError::Client("bad date".into()).is_retryable());
        assert!(!ApiError::MalformedResponse("missing field".into()).is_retryable());
        assert!(!ApiError::ServiceUnavailable.is_retryable());
    }
}
