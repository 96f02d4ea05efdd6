//! Error types for the mosaic pipeline.

use thiserror::Error;

/// Result type alias using mosaic's Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for mosaic operations.
///
/// Service errors carry a transient/permanent split: transient errors
/// (network failures, 408/429/5xx) are eligible for retry with backoff,
/// permanent errors (other 4xx, malformed requests) are not.
#[derive(Error, Debug)]
pub enum Error {
    /// Remote service failure that is worth retrying (network, 408/429/5xx).
    #[error("Transient {service} error{}: {message}", fmt_status(.status))]
    TransientService {
        service: &'static str,
        status: Option<u16>,
        message: String,
    },

    /// Remote service failure that will not succeed on retry (other 4xx).
    #[error("Permanent {service} error{}: {message}", fmt_status(.status))]
    PermanentService {
        service: &'static str,
        status: Option<u16>,
        message: String,
    },

    /// Embedding response count does not match the request count.
    #[error("Embedding shape mismatch: requested {expected}, received {actual}")]
    ShapeMismatch { expected: usize, actual: usize },

    /// Unreadable or corrupt input image — skipped, never auto-retried.
    #[error("Malformed input: {0}")]
    MalformedInput(String),

    /// Ledger or state-file corruption or invariant violation.
    #[error("State error: {0}")]
    State(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// File I/O operation failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

fn fmt_status(status: &Option<u16>) -> String {
    match status {
        Some(code) => format!(" ({})", code),
        None => String::new(),
    }
}

impl Error {
    /// Classify a non-success HTTP status into a transient or permanent
    /// service error. 408, 429, and 5xx are transient; other statuses are
    /// permanent.
    pub fn from_status(service: &'static str, status: u16, message: impl Into<String>) -> Self {
        let message = message.into();
        if status == 408 || status == 429 || (500..=599).contains(&status) {
            Error::TransientService {
                service,
                status: Some(status),
                message,
            }
        } else {
            Error::PermanentService {
                service,
                status: Some(status),
                message,
            }
        }
    }

    /// Transient service error with no HTTP status (transport failure).
    pub fn transport(service: &'static str, message: impl Into<String>) -> Self {
        Error::TransientService {
            service,
            status: None,
            message: message.into(),
        }
    }

    /// Check if this error is worth retrying with backoff.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Error::TransientService { .. })
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Serialization(e.to_string())
    }
}

impl From<reqwest::Error> for Error {
    fn from(e: reqwest::Error) -> Self {
        // Transport-level failures (connect, timeout, body) have no status
        // and are always retryable.
        Error::TransientService {
            service: "http",
            status: e.status().map(|s| s.as_u16()),
            message: e.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_status_5xx_is_transient() {
        for status in [500, 502, 503, 599] {
            let err = Error::from_status("embed", status, "boom");
            assert!(err.is_retryable(), "status {} should be transient", status);
        }
    }

    #[test]
    fn test_from_status_rate_limit_is_transient() {
        assert!(Error::from_status("embed", 429, "slow down").is_retryable());
        assert!(Error::from_status("embed", 408, "timeout").is_retryable());
    }

    #[test]
    fn test_from_status_4xx_is_permanent() {
        for status in [400, 401, 403, 404, 422] {
            let err = Error::from_status("map", status, "rejected");
            assert!(!err.is_retryable(), "status {} should be permanent", status);
        }
    }

    #[test]
    fn test_transport_is_retryable() {
        assert!(Error::transport("embed", "connection refused").is_retryable());
    }

    #[test]
    fn test_shape_mismatch_not_retryable() {
        let err = Error::ShapeMismatch {
            expected: 10,
            actual: 9,
        };
        assert!(!err.is_retryable());
        assert_eq!(
            err.to_string(),
            "Embedding shape mismatch: requested 10, received 9"
        );
    }

    #[test]
    fn test_display_includes_status() {
        let err = Error::from_status("embed", 503, "unavailable");
        assert_eq!(err.to_string(), "Transient embed error (503): unavailable");

        let err = Error::transport("map", "refused");
        assert_eq!(err.to_string(), "Transient map error: refused");
    }

    #[test]
    fn test_display_malformed_input() {
        let err = Error::MalformedInput("not an image: foo.jpg".to_string());
        assert_eq!(err.to_string(), "Malformed input: not an image: foo.jpg");
    }

    #[test]
    fn test_from_serde_json_error() {
        let json_err = serde_json::from_str::<i32>("not a number").unwrap_err();
        let err: Error = json_err.into();
        match err {
            Error::Serialization(msg) => assert!(!msg.is_empty()),
            _ => panic!("Expected Serialization error"),
        }
    }

    #[test]
    fn test_from_io_error() {
        let io_err = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "access denied");
        let err: Error = io_err.into();
        assert!(matches!(err, Error::Io(_)));
        assert!(!err.is_retryable());
    }

    #[test]
    fn test_error_is_send_sync() {
        fn assert_send<T: Send>() {}
        fn assert_sync<T: Sync>() {}

        assert_send::<Error>();
        assert_sync::<Error>();
    }
}
