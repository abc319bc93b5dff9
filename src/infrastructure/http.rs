//! Shared HTTP failure classification for the API clients.

use std::time::Duration;

use crate::domain::error::ApiError;

/// Map a non-success response onto an error kind. 429 becomes `RateLimited`
/// (honoring Retry-After when parseable), other 4xx become `Client`, and
/// 5xx become retryable `Transport` failures.
pub(crate) async fn failure_from_response(response: reqwest::Response) -> ApiError {
    let status = response.status();
    let retry_after = response
        .headers()
        .get(reqwest::header::RETRY_AFTER)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.trim().parse::<u64>().ok())
        .map(Duration::from_secs);
    let body = response.text().await.unwrap_or_default();

    if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
        return ApiError::RateLimited { retry_after };
    }
    if status.is_client_error() {
        return ApiError::Client(format!("HTTP {status}: {body}"));
    }
    ApiError::Transport(format!("HTTP {status}: {body}"))
}

pub(crate) fn transport(error: reqwest::Error) -> ApiError {
    ApiError::Transport(error.to_string())
}
