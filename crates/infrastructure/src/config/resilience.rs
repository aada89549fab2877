//! Retry and circuit breaker settings

use serde::{Deserialize, Serialize};

use crate::adapters::CircuitBreakerConfig;
use crate::retry::RetryConfig;

/// Resilience configuration for upstream calls
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ResilienceConfig {
    /// Retry policy for transient upstream failures
    pub retry: RetryConfig,
    /// Circuit breaker thresholds
    pub circuit_breaker: CircuitBreakerConfig,
}
