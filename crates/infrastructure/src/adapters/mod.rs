//! Adapters implementing application ports over external services

mod circuit_breaker;
mod forecast_adapter;

pub use circuit_breaker::{
    CircuitBreaker, CircuitBreakerConfig, CircuitBreakerError, CircuitOpenError, CircuitState,
};
pub use forecast_adapter::ForecastSourceAdapter;
