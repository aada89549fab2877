//! Circuit breaker pattern for the upstream forecast source
//!
//! Prevents hammering an upstream that is already failing: after a run of
//! consecutive failures the circuit opens and calls fail fast without
//! touching the network, until a cool-down period allows a probe through.
//!
//! # States
//!
//! - **Closed**: normal operation, requests pass through
//! - **Open**: requests fail fast without calling the service
//! - **Half-Open**: a probe request tests whether the service recovered

use std::fmt;
use std::time::{Duration, Instant};

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::retry::Retryable;

/// Thresholds and timing for a circuit breaker
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CircuitBreakerConfig {
    /// Consecutive failures that trip the circuit open
    pub failure_threshold: u32,
    /// Consecutive half-open successes needed to close again
    pub success_threshold: u32,
    /// Cool-down in seconds before a probe is allowed
    pub open_duration_secs: u64,
}

impl Default for CircuitBreakerConfig {
    fn default() -> Self {
        Self {
            failure_threshold: 5,
            success_threshold: 1,
            open_duration_secs: 30,
        }
    }
}

/// Position of the breaker in its state machine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CircuitState {
    /// Calls pass through normally
    Closed,
    /// Upstream is considered down, calls fail fast
    Open,
    /// One probe call is allowed through to test recovery
    HalfOpen,
}

impl fmt::Display for CircuitState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Closed => write!(f, "closed"),
            Self::Open => write!(f, "open"),
            Self::HalfOpen => write!(f, "half-open"),
        }
    }
}

/// Returned when a call is refused because the circuit is open
#[derive(Debug, Clone)]
pub struct CircuitOpenError {
    /// Which guarded upstream refused the call
    pub service_name: String,
}

impl std::error::Error for CircuitOpenError {}

impl fmt::Display for CircuitOpenError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "circuit for '{}' is open, refusing calls until the cool-down expires",
            self.service_name
        )
    }
}

struct BreakerState {
    state: CircuitState,
    failure_count: u32,
    success_count: u32,
    opened_at: Option<Instant>,
}

/// Guards calls to one upstream, tripping open after repeated failures
pub struct CircuitBreaker {
    name: String,
    config: CircuitBreakerConfig,
    state: RwLock<BreakerState>,
}

impl fmt::Debug for CircuitBreaker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CircuitBreaker")
            .field("name", &self.name)
            .field("state", &self.state())
            .finish_non_exhaustive()
    }
}

impl CircuitBreaker {
    /// Creates a circuit breaker with default configuration.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self::with_config(name, CircuitBreakerConfig::default())
    }

    /// Creates a circuit breaker with custom configuration.
    #[must_use]
    pub fn with_config(name: impl Into<String>, config: CircuitBreakerConfig) -> Self {
        Self {
            name: name.into(),
            config,
            state: RwLock::new(BreakerState {
                state: CircuitState::Closed,
                failure_count: 0,
                success_count: 0,
                opened_at: None,
            }),
        }
    }

    /// Returns the name of this circuit breaker.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the current state, applying the Open to Half-Open timeout.
    #[must_use]
    pub fn state(&self) -> CircuitState {
        let mut state = self.state.write();

        let cooled_down = state.state == CircuitState::Open
            && state
                .opened_at
                .is_some_and(|t| t.elapsed() >= Duration::from_secs(self.config.open_duration_secs));
        if cooled_down {
            debug!(service = %self.name, "Cool-down elapsed, allowing a probe call");
            state.state = CircuitState::HalfOpen;
            state.success_count = 0;
        }

        state.state
    }

    /// Returns true if the circuit is closed (normal operation).
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.state() == CircuitState::Closed
    }

    /// Returns true if the circuit is open (calls fail fast).
    #[must_use]
    pub fn is_open(&self) -> bool {
        self.state() == CircuitState::Open
    }

    fn on_success(&self) {
        let mut state = self.state.write();
        state.failure_count = 0;

        if state.state != CircuitState::HalfOpen {
            return;
        }
        state.success_count += 1;
        if state.success_count >= self.config.success_threshold {
            tracing::info!(service = %self.name, "Probe succeeded, closing circuit");
            state.state = CircuitState::Closed;
            state.success_count = 0;
            state.opened_at = None;
        }
    }

    fn on_failure(&self) {
        let mut state = self.state.write();
        state.failure_count += 1;
        state.success_count = 0;

        // A single failure reopens a half-open circuit; a closed one opens
        // only once the threshold is reached.
        let should_open = match state.state {
            CircuitState::Closed => state.failure_count >= self.config.failure_threshold,
            CircuitState::HalfOpen => true,
            CircuitState::Open => false,
        };
        if should_open {
            warn!(
                service = %self.name,
                failures = state.failure_count,
                from = %state.state,
                "Opening circuit"
            );
            state.state = CircuitState::Open;
            state.opened_at = Some(Instant::now());
            state.failure_count = 0;
        }
    }

    /// Calls an async operation through the circuit breaker.
    ///
    /// # Errors
    ///
    /// Returns `CircuitBreakerError::CircuitOpen` when the circuit is open,
    /// or `CircuitBreakerError::ServiceError` wrapping the operation's error.
    pub async fn call<F, Fut, T, E>(&self, f: F) -> Result<T, CircuitBreakerError<E>>
    where
        F: FnOnce() -> Fut,
        Fut: std::future::Future<Output = Result<T, E>>,
        E: std::fmt::Debug,
    {
        if self.state() == CircuitState::Open {
            debug!(service = %self.name, "Failing fast, circuit is open");
            return Err(CircuitBreakerError::CircuitOpen(CircuitOpenError {
                service_name: self.name.clone(),
            }));
        }

        match f().await {
            Ok(value) => {
                self.on_success();
                Ok(value)
            },
            Err(err) => {
                warn!(service = %self.name, error = ?err, "Guarded call failed");
                self.on_failure();
                Err(CircuitBreakerError::ServiceError(err))
            },
        }
    }
}

/// Either a refusal from an open circuit or the call's own error
#[derive(Debug)]
pub enum CircuitBreakerError<E> {
    /// The call was refused without being attempted
    CircuitOpen(CircuitOpenError),
    /// The call went through and failed
    ServiceError(E),
}

impl<E: fmt::Display> fmt::Display for CircuitBreakerError<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::CircuitOpen(e) => write!(f, "{e}"),
            Self::ServiceError(e) => write!(f, "{e}"),
        }
    }
}

impl<E: std::error::Error + 'static> std::error::Error for CircuitBreakerError<E> {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::CircuitOpen(e) => Some(e),
            Self::ServiceError(e) => Some(e),
        }
    }
}

impl<E> CircuitBreakerError<E> {
    /// Returns true if this is a circuit open error.
    #[must_use]
    pub const fn is_circuit_open(&self) -> bool {
        matches!(self, Self::CircuitOpen(_))
    }

    /// Returns the inner service error if present.
    #[must_use]
    pub fn into_service_error(self) -> Option<E> {
        match self {
            Self::ServiceError(e) => Some(e),
            Self::CircuitOpen(_) => None,
        }
    }
}

// An open circuit is a deliberate fail-fast; retrying would defeat it.
impl<E: Retryable> Retryable for CircuitBreakerError<E> {
    fn is_retryable(&self) -> bool {
        match self {
            Self::CircuitOpen(_) => false,
            Self::ServiceError(e) => e.is_retryable(),
        }
    }
}
