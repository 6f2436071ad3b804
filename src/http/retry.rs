//! Retry classification for store and download requests.

use reqwest::StatusCode;

/// Maximum number of attempts for a single request.
pub const MAX_RETRIES: usize = 3;

/// Delay between attempts in milliseconds.
pub const RETRY_DELAY_MS: u64 = 1000;

/// Errors that will not succeed on a second attempt.
#[derive(Debug)]
pub enum NonRetryableError {
    /// HTTP 429
    RateLimitExceeded(String),
    /// HTTP 401
    AuthenticationFailed(String),
    /// HTTP 404: unknown snap, or a revision that was never published
    NotFound(String),
    /// HTTP 403
    Forbidden(String),
    /// Any other 4xx
    ClientError(String),
}

impl std::fmt::Display for NonRetryableError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            NonRetryableError::RateLimitExceeded(msg) => {
                write!(
                    f,
                    "Rate limit exceeded: {}. Try again later or lower --workers.",
                    msg
                )
            }
            NonRetryableError::AuthenticationFailed(msg) => {
                write!(f, "Authentication failed: {}", msg)
            }
            NonRetryableError::NotFound(msg) => {
                write!(f, "Not found: {}", msg)
            }
            NonRetryableError::Forbidden(msg) => {
                write!(f, "Access forbidden: {}", msg)
            }
            NonRetryableError::ClientError(msg) => {
                write!(f, "Request error: {}", msg)
            }
        }
    }
}

impl std::error::Error for NonRetryableError {}

/// Returns Ok(()) when the error is worth retrying, otherwise the
/// non-retryable classification.
pub fn classify_error(error: &reqwest::Error) -> Result<(), NonRetryableError> {
    if let Some(status) = error.status() {
        match status {
            StatusCode::UNAUTHORIZED => {
                return Err(NonRetryableError::AuthenticationFailed(
                    "The store rejected the request as unauthenticated".to_string(),
                ));
            }
            StatusCode::FORBIDDEN => {
                return Err(NonRetryableError::Forbidden(
                    "The store refused access to this resource".to_string(),
                ));
            }
            StatusCode::TOO_MANY_REQUESTS => {
                return Err(NonRetryableError::RateLimitExceeded(
                    "Too many requests".to_string(),
                ));
            }
            StatusCode::NOT_FOUND => {
                return Err(NonRetryableError::NotFound(
                    error
                        .url()
                        .map(|u| u.path().to_string())
                        .unwrap_or_else(|| "the requested resource".to_string()),
                ));
            }
            s if s.is_client_error() => {
                return Err(NonRetryableError::ClientError(format!(
                    "HTTP {} error",
                    s.as_u16()
                )));
            }
            // 5xx
            _ => {}
        }
    }

    // Connection errors, timeouts, etc.
    Ok(())
}

/// Converts an `error_for_status()` failure into an anyhow error, keeping the
/// original reqwest error when it is retryable.
pub fn check_retryable(error: reqwest::Error) -> anyhow::Error {
    match classify_error(&error) {
        Ok(()) => anyhow::Error::from(error),
        Err(non_retryable) => anyhow::Error::from(non_retryable),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn status_error(status: usize) -> reqwest::Error {
        status_error_with_body(status, "").await
    }

    async fn status_error_with_body(status: usize, body: &str) -> reqwest::Error {
        let mut server = mockito::Server::new_async().await;
        let _m = server
            .mock("GET", "/")
            .with_status(status)
            .with_body(body)
            .create_async()
            .await;

        let client = reqwest::Client::new();
        let response = client.get(server.url()).send().await.unwrap();
        response.error_for_status().unwrap_err()
    }

    #[test]
    fn test_non_retryable_error_display() {
        let err = NonRetryableError::RateLimitExceeded("test".to_string());
        assert!(err.to_string().contains("Rate limit"));
        assert!(err.to_string().contains("--workers"));

        let err = NonRetryableError::NotFound("/api/v1/snaps/download/x_1.snap".to_string());
        assert_eq!(
            err.to_string(),
            "Not found: /api/v1/snaps/download/x_1.snap"
        );

        let err = NonRetryableError::ClientError("HTTP 400 error".to_string());
        assert!(err.to_string().contains("Request error"));
    }

    #[tokio::test]
    async fn test_classify_error_unauthorized() {
        let err = status_error(401).await;
        assert!(matches!(
            classify_error(&err),
            Err(NonRetryableError::AuthenticationFailed(_))
        ));
    }

    #[tokio::test]
    async fn test_classify_error_forbidden() {
        let err = status_error(403).await;
        assert!(matches!(
            classify_error(&err),
            Err(NonRetryableError::Forbidden(_))
        ));
    }

    #[tokio::test]
    async fn test_classify_error_forbidden_ignores_body() {
        let err = status_error_with_body(403, "API rate limit exceeded").await;
        assert!(matches!(
            classify_error(&err),
            Err(NonRetryableError::Forbidden(_))
        ));
    }

    #[tokio::test]
    async fn test_classify_error_too_many_requests() {
        let err = status_error(429).await;
        assert!(matches!(
            classify_error(&err),
            Err(NonRetryableError::RateLimitExceeded(_))
        ));
    }

    #[tokio::test]
    async fn test_classify_error_not_found_carries_path() {
        let err = status_error(404).await;
        match classify_error(&err) {
            Err(NonRetryableError::NotFound(path)) => assert_eq!(path, "/"),
            other => panic!("Expected NotFound, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_classify_error_other_client_error() {
        let err = status_error(400).await;
        assert!(matches!(
            classify_error(&err),
            Err(NonRetryableError::ClientError(_))
        ));
    }

    #[tokio::test]
    async fn test_classify_error_server_error_is_retryable() {
        let err = status_error(502).await;
        assert!(classify_error(&err).is_ok());
    }

    #[tokio::test]
    async fn test_check_retryable() {
        let err = status_error(404).await;
        assert!(
            check_retryable(err)
                .downcast_ref::<NonRetryableError>()
                .is_some()
        );

        let err = status_error(503).await;
        assert!(
            check_retryable(err)
                .downcast_ref::<NonRetryableError>()
                .is_none()
        );
    }
}
