//! Fetch error taxonomy

use thiserror::Error;

/// Errors produced while fetching and decoding the forecast stream.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    /// The upstream answered with a non-success HTTP status
    #[error("upstream returned HTTP {0}")]
    Status(u16),

    /// The connection could not be established
    #[error("connection failed: {0}")]
    Connect(String),

    /// The request timed out
    #[error("request timed out")]
    Timeout,

    /// The payload is not a well-formed JSON array of records
    #[error("invalid payload: {0}")]
    Decode(String),

    /// I/O failure while reading the response body mid-stream
    #[error("stream read failed: {0}")]
    Read(String),
}

impl FetchError {
    /// Transient failures are eligible for retry: server errors, request
    /// timeouts and connection-level faults. Everything else is final.
    #[must_use]
    pub const fn is_transient(&self) -> bool {
        match self {
            Self::Status(code) => *code >= 500 || *code == 408,
            Self::Connect(_) | Self::Timeout => true,
            Self::Decode(_) | Self::Read(_) => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn server_errors_are_transient() {
        assert!(FetchError::Status(500).is_transient());
        assert!(FetchError::Status(503).is_transient());
        assert!(FetchError::Status(408).is_transient());
    }

    #[test]
    fn client_errors_are_not_transient() {
        assert!(!FetchError::Status(400).is_transient());
        assert!(!FetchError::Status(404).is_transient());
        assert!(!FetchError::Status(429).is_transient());
    }

    #[test]
    fn transport_faults_are_transient() {
        assert!(FetchError::Connect("refused".into()).is_transient());
        assert!(FetchError::Timeout.is_transient());
    }

    #[test]
    fn payload_faults_are_final() {
        assert!(!FetchError::Decode("not an array".into()).is_transient());
        assert!(!FetchError::Read("reset".into()).is_transient());
    }

    #[test]
    fn display_includes_status_code() {
        assert_eq!(FetchError::Status(502).to_string(), "upstream returned HTTP 502");
    }
}
