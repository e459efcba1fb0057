//! GitHub API error types.

use chrono::{DateTime, Utc};
use thiserror::Error;

/// Errors that can occur when talking to the GitHub API.
#[derive(Debug, Error)]
pub enum GitHubError {
    #[error("GitHub API error (HTTP {status}): {message}")]
    Api { status: u16, message: String },

    #[error("Rate limit exceeded. Resets at {reset_at}")]
    RateLimited { reset_at: DateTime<Utc> },

    #[error("Authentication required or token rejected")]
    AuthRequired,

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl GitHubError {
    /// Check if this error indicates rate limit exhaustion.
    #[inline]
    pub fn is_rate_limited(&self) -> bool {
        matches!(self, Self::RateLimited { .. })
    }

    /// Check if this error is transient and worth retrying.
    ///
    /// Rate limit exhaustion is deliberately NOT transient: retrying
    /// immediately would only re-trigger the limit, so it propagates to
    /// the caller with the reset time instead.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Network(_) => true,
            Self::Api { status, .. } => *status >= 500,
            _ => false,
        }
    }

    /// Seconds until the rate limit window resets, if this is a
    /// rate-limit error. Clamped at zero for a reset time in the past.
    pub fn cooldown_secs(&self) -> Option<i64> {
        match self {
            Self::RateLimited { reset_at } => {
                Some((*reset_at - Utc::now()).num_seconds().max(0))
            }
            _ => None,
        }
    }
}

/// Extract a short error message suitable for display.
///
/// Takes the first line of an error message, which keeps progress
/// reporting readable for errors that carry multi-line detail.
#[inline]
pub fn short_error_message(e: &impl std::error::Error) -> String {
    let full = e.to_string();
    full.lines().next().unwrap_or(&full).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn rate_limited_is_not_transient() {
        let err = GitHubError::RateLimited {
            reset_at: Utc::now(),
        };
        assert!(err.is_rate_limited());
        assert!(!err.is_transient());
    }

    #[test]
    fn server_errors_are_transient_client_errors_are_not() {
        let server = GitHubError::Api {
            status: 502,
            message: "bad gateway".to_string(),
        };
        assert!(server.is_transient());

        let client = GitHubError::Api {
            status: 422,
            message: "unprocessable".to_string(),
        };
        assert!(!client.is_transient());

        assert!(GitHubError::Network("connection reset".to_string()).is_transient());
        assert!(!GitHubError::AuthRequired.is_transient());
        assert!(!GitHubError::NotFound("/users/ghost".to_string()).is_transient());
    }

    #[test]
    fn cooldown_is_clamped_at_zero() {
        let expired = GitHubError::RateLimited {
            reset_at: Utc::now() - Duration::minutes(5),
        };
        assert_eq!(expired.cooldown_secs(), Some(0));

        let pending = GitHubError::RateLimited {
            reset_at: Utc::now() + Duration::minutes(5),
        };
        assert!(pending.cooldown_secs().unwrap() > 0);

        assert_eq!(GitHubError::AuthRequired.cooldown_secs(), None);
    }

    #[test]
    fn short_error_message_takes_first_line() {
        let err = std::io::Error::other("first line\nsecond line");
        assert_eq!(short_error_message(&err), "first line");
    }
}
