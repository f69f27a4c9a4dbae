//! Error types for the Model Router client

use thiserror::Error;

/// Result type alias for router operations.
pub type Result<T> = std::result::Result<T, RouterError>;

/// Errors that can occur when talking to the Model Router.
///
/// Authentication and budget failures are terminal for the call and are
/// never retried; rate limits and transport failures are retried within
/// the client's budget.
#[derive(Error, Debug)]
pub enum RouterError {
    /// Upstream returned 401 — the JWT was rejected or revoked.
    #[error("model router rejected authentication (401)")]
    Auth,

    /// Upstream returned 402 — the account budget is exhausted.
    #[error("model router budget exceeded (402)")]
    BudgetExceeded,

    /// Upstream returned 429; `retry_after` carries the Retry-After header.
    #[error("model router rate limit (429)")]
    RateLimited { retry_after: Option<u64> },

    /// Any other non-2xx status, with the body's error message.
    #[error("model router returned {status}: {message}")]
    Api { status: u16, message: String },

    /// Request timed out at the HTTP layer.
    #[error("model router request timed out")]
    Timeout,

    /// Connection-level failure.
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// 2xx response whose body did not match the expected shape.
    #[error("failed to parse router response: {0}")]
    Parse(String),
}

impl RouterError {
    /// Whether the retry loop may attempt this call again.
    pub fn is_retryable(&self) -> bool {
        !matches!(self, RouterError::Auth | RouterError::BudgetExceeded)
    }

    /// Whether this is an authentication failure.
    pub fn is_auth(&self) -> bool {
        matches!(self, RouterError::Auth)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_auth_and_budget_are_terminal() {
        assert!(!RouterError::Auth.is_retryable());
        assert!(!RouterError::BudgetExceeded.is_retryable());
    }

    #[test]
    fn test_rate_limit_and_api_errors_retry() {
        assert!(RouterError::RateLimited { retry_after: Some(3) }.is_retryable());
        assert!(RouterError::Api {
            status: 503,
            message: "overloaded".to_string()
        }
        .is_retryable());
        assert!(RouterError::Timeout.is_retryable());
        assert!(RouterError::Parse("bad json".to_string()).is_retryable());
    }
}
