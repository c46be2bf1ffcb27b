use chrono::{DateTime, Utc};
use thiserror::Error;

#[derive(Error, Debug, Clone)]
pub enum PlatformError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Rate limited with HTTP {status} (resets at {reset_at:?})")]
    RateLimited {
        status: u16,
        reset_at: Option<DateTime<Utc>>,
    },

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("HTTP {status}: {message}")]
    Status { status: u16, message: String },

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Decode error: {0}")]
    Decode(String),

    #[error("Invalid repository reference: {0}")]
    InvalidRepo(String),

    #[error("Operation cancelled")]
    Cancelled,
}

impl PlatformError {
    /// HTTP status behind the error, when there was one.
    pub fn status(&self) -> Option<u16> {
        match self {
            PlatformError::NotFound(_) => Some(404),
            PlatformError::Unauthorized(_) => Some(401),
            PlatformError::Forbidden(_) => Some(403),
            PlatformError::Conflict(_) => Some(409),
            PlatformError::RateLimited { status, .. } => Some(*status),
            PlatformError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Classify a non-success response.
    ///
    /// GitHub reports exhausted rate limits as 403 with
    /// `x-ratelimit-remaining: 0`, secondary limits as 429.
    pub fn from_response(
        status: u16,
        ratelimit_remaining: Option<u64>,
        ratelimit_reset: Option<i64>,
        message: String,
    ) -> Self {
        let reset_at = ratelimit_reset.and_then(|secs| DateTime::<Utc>::from_timestamp(secs, 0));
        match status {
            429 => PlatformError::RateLimited { status, reset_at },
            403 if ratelimit_remaining == Some(0) => PlatformError::RateLimited { status, reset_at },
            401 => PlatformError::Unauthorized(message),
            403 => PlatformError::Forbidden(message),
            404 => PlatformError::NotFound(message),
            409 | 422 => PlatformError::Conflict(message),
            _ => PlatformError::Status { status, message },
        }
    }
}

impl From<reqwest::Error> for PlatformError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            PlatformError::Decode(err.to_string())
        } else {
            PlatformError::Transport(err.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rate_limit_classification() {
        let exhausted =
            PlatformError::from_response(403, Some(0), Some(1_700_000_000), "limit".into());
        assert!(matches!(
            exhausted,
            PlatformError::RateLimited { status: 403, reset_at: Some(_) }
        ));
        assert_eq!(exhausted.status(), Some(403));

        let secondary = PlatformError::from_response(429, None, None, "slow down".into());
        assert!(matches!(
            secondary,
            PlatformError::RateLimited { status: 429, reset_at: None }
        ));
        assert_eq!(secondary.status(), Some(429));
        assert!(matches!(
            PlatformError::from_response(403, Some(12), None, "nope".into()),
            PlatformError::Forbidden(_)
        ));
    }

    #[test]
    fn test_status_classification() {
        assert!(matches!(
            PlatformError::from_response(404, None, None, "x".into()),
            PlatformError::NotFound(_)
        ));
        assert!(matches!(
            PlatformError::from_response(422, None, None, "x".into()),
            PlatformError::Conflict(_)
        ));
        let err = PlatformError::from_response(502, None, None, "bad gateway".into());
        assert_eq!(err.status(), Some(502));
    }
}
