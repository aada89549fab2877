//! Forecast source adapter
//!
//! Implements the application's forecast source port on top of the HTTP
//! client, wrapping each fetch in a retry policy and a circuit breaker.
//! Only the request phase (up to response headers) is protected; records
//! already consumed from a stream cannot be replayed, so mid-stream errors
//! are surfaced to the caller unretried.

use std::sync::Arc;

use application::ports::{ForecastSourcePort, ForecastStream};
use application::ApplicationError;
use async_trait::async_trait;
use futures::StreamExt;
use integration_forecast::{FetchError, ForecastClient};
use tracing::instrument;

use crate::adapters::circuit_breaker::{CircuitBreaker, CircuitBreakerError};
use crate::config::ResilienceConfig;
use crate::retry::{with_retry, RetryConfig};

/// Adapter exposing the upstream forecast service to the application layer.
#[derive(Debug)]
pub struct ForecastSourceAdapter {
    client: ForecastClient,
    retry_config: RetryConfig,
    breaker: Arc<CircuitBreaker>,
}

impl ForecastSourceAdapter {
    /// Build the adapter with the given resilience policy.
    #[must_use]
    pub fn new(client: ForecastClient, resilience: &ResilienceConfig) -> Self {
        Self {
            client,
            retry_config: resilience.retry.clone(),
            breaker: Arc::new(CircuitBreaker::with_config(
                "forecast-source",
                resilience.circuit_breaker.clone(),
            )),
        }
    }
}

#[async_trait]
impl ForecastSourcePort for ForecastSourceAdapter {
    #[instrument(skip(self))]
    async fn fetch_forecasts(&self) -> Result<ForecastStream, ApplicationError> {
        let result = with_retry(&self.retry_config, || {
            self.breaker.call(|| self.client.fetch())
        })
        .await;

        match result.into_result() {
            Ok(stream) => {
                metrics::counter!("forecast_fetch_total", "outcome" => "success").increment(1);
                Ok(stream.map(|item| item.map_err(map_fetch_error)).boxed())
            },
            Err(e) => {
                metrics::counter!("forecast_fetch_total", "outcome" => "error").increment(1);
                Err(map_breaker_error(e))
            },
        }
    }

    async fn is_available(&self) -> bool {
        !self.breaker.is_open()
    }
}

fn map_breaker_error(error: CircuitBreakerError<FetchError>) -> ApplicationError {
    match error {
        CircuitBreakerError::CircuitOpen(e) => ApplicationError::UpstreamUnavailable(e.to_string()),
        CircuitBreakerError::ServiceError(e) => map_fetch_error(e),
    }
}

fn map_fetch_error(error: FetchError) -> ApplicationError {
    match error {
        FetchError::Status(code) if error.is_transient() => {
            ApplicationError::UpstreamUnavailable(format!("upstream returned HTTP {code}"))
        },
        FetchError::Status(code) => {
            ApplicationError::UpstreamBadResponse(format!("upstream returned HTTP {code}"))
        },
        FetchError::Connect(msg) => {
            ApplicationError::UpstreamUnavailable(format!("connection failed: {msg}"))
        },
        FetchError::Timeout => {
            ApplicationError::UpstreamUnavailable("request timed out".to_string())
        },
        FetchError::Decode(msg) => ApplicationError::MalformedPayload(msg),
        FetchError::Read(msg) => ApplicationError::Transport(msg),
    }
}
