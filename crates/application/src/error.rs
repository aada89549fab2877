//! Application-level errors
//!
//! The upstream-fault taxonomy is fixed: retry and circuit breaking happen
//! exclusively below this layer, so by the time an error carries one of
//! these variants the fetch is final.

use thiserror::Error;

/// Errors that can occur in the application layer.
///
/// `Clone` is required so a single failed computation can be surfaced to
/// every waiter sharing it through the result cache.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ApplicationError {
    /// The forecast source is unreachable: circuit open or retries exhausted
    #[error("upstream unavailable: {0}")]
    UpstreamUnavailable(String),

    /// The forecast source answered with a non-retryable error status
    #[error("upstream bad response: {0}")]
    UpstreamBadResponse(String),

    /// The forecast payload is structurally invalid
    #[error("malformed payload: {0}")]
    MalformedPayload(String),

    /// I/O failure while reading the response stream
    #[error("transport error: {0}")]
    Transport(String),

    /// The operation was cancelled by the caller
    #[error("operation cancelled")]
    Cancelled,

    /// Configuration error
    #[error("configuration error: {0}")]
    Configuration(String),

    /// Internal error
    #[error("internal error: {0}")]
    Internal(String),
}

impl ApplicationError {
    /// True for faults caused by the upstream forecast source, which the
    /// HTTP boundary collapses to a single service-unavailable status.
    pub const fn is_upstream_fault(&self) -> bool {
        matches!(
            self,
            Self::UpstreamUnavailable(_)
                | Self::UpstreamBadResponse(_)
                | Self::MalformedPayload(_)
                | Self::Transport(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_messages() {
        let err = ApplicationError::UpstreamUnavailable("breaker open".into());
        assert_eq!(err.to_string(), "upstream unavailable: breaker open");

        let err = ApplicationError::MalformedPayload("not an array".into());
        assert_eq!(err.to_string(), "malformed payload: not an array");

        assert_eq!(ApplicationError::Cancelled.to_string(), "operation cancelled");
    }

    #[test]
    fn upstream_fault_classification() {
        assert!(ApplicationError::UpstreamUnavailable(String::new()).is_upstream_fault());
        assert!(ApplicationError::UpstreamBadResponse(String::new()).is_upstream_fault());
        assert!(ApplicationError::MalformedPayload(String::new()).is_upstream_fault());
        assert!(ApplicationError::Transport(String::new()).is_upstream_fault());
        assert!(!ApplicationError::Cancelled.is_upstream_fault());
        assert!(!ApplicationError::Internal(String::new()).is_upstream_fault());
        assert!(!ApplicationError::Configuration(String::new()).is_upstream_fault());
    }

    #[test]
    fn errors_are_cloneable_for_shared_waiters() {
        let err = ApplicationError::Transport("reset".into());
        assert_eq!(err.clone(), err);
    }
}
