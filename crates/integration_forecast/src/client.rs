//! HTTP client for the upstream weather forecast source
//!
//! Fetches `GET /WeatherForecast` and exposes the response body as a stream
//! of decoded records. The full payload is never buffered; bytes are decoded
//! as they arrive, so arbitrarily large forecast collections are processed
//! in constant memory per record.

use std::collections::VecDeque;
use std::pin::Pin;
use std::time::Duration;

use bytes::Bytes;
use domain::ForecastRecord;
use futures::stream::BoxStream;
use futures::{Stream, StreamExt};
use serde::Deserialize;
use tracing::{debug, instrument};

use crate::decode::JsonArrayDecoder;
use crate::error::FetchError;

const FORECAST_PATH: &str = "/WeatherForecast";

/// Stream of forecast records decoded from an open upstream response.
pub type RecordStream = BoxStream<'static, Result<ForecastRecord, FetchError>>;

/// Configuration for the forecast source client.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ForecastClientConfig {
    /// Base URL of the upstream service
    pub base_url: String,
    /// Request timeout in seconds
    pub timeout_secs: u64,
}

impl Default for ForecastClientConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:5000".to_string(),
            timeout_secs: 30,
        }
    }
}

/// Client for the upstream forecast endpoint.
#[derive(Debug, Clone)]
pub struct ForecastClient {
    client: reqwest::Client,
    config: ForecastClientConfig,
}

impl ForecastClient {
    /// Build a client with the given configuration.
    ///
    /// # Errors
    ///
    /// Returns `FetchError::Connect` when the underlying HTTP client cannot
    /// be constructed.
    pub fn new(config: ForecastClientConfig) -> Result<Self, FetchError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| FetchError::Connect(e.to_string()))?;
        Ok(Self { client, config })
    }

    /// Build a client with default configuration.
    ///
    /// # Errors
    ///
    /// Returns `FetchError::Connect` when the underlying HTTP client cannot
    /// be constructed.
    pub fn with_defaults() -> Result<Self, FetchError> {
        Self::new(ForecastClientConfig::default())
    }

    /// Request the current forecast collection.
    ///
    /// Completes once the response headers arrive; the body is consumed
    /// lazily through the returned stream. Errors before the first byte of
    /// the body (connect failures, timeouts, non-2xx statuses) are returned
    /// here, while body read and decode failures surface as stream items.
    ///
    /// # Errors
    ///
    /// Returns `FetchError::Connect`, `FetchError::Timeout` or
    /// `FetchError::Status` depending on how the request failed.
    #[instrument(skip(self), fields(base_url = %self.config.base_url))]
    pub async fn fetch(&self) -> Result<RecordStream, FetchError> {
        let url = format!(
            "{}{FORECAST_PATH}",
            self.config.base_url.trim_end_matches('/')
        );
        debug!(url = %url, "Requesting forecast collection");

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(map_request_error)?;

        let status = response.status();
        if !status.is_success() {
            debug!(status = status.as_u16(), "Upstream returned error status");
            return Err(FetchError::Status(status.as_u16()));
        }

        Ok(record_stream(response.bytes_stream()))
    }
}

fn map_request_error(error: reqwest::Error) -> FetchError {
    if error.is_timeout() {
        FetchError::Timeout
    } else {
        FetchError::Connect(error.to_string())
    }
}

struct DecodeState {
    body: Pin<Box<dyn Stream<Item = Result<Bytes, reqwest::Error>> + Send>>,
    decoder: JsonArrayDecoder<ForecastRecord>,
    ready: VecDeque<ForecastRecord>,
    pending_error: Option<FetchError>,
    finished: bool,
}

/// Wrap a response body stream into a stream of decoded records.
///
/// Records decoded before a failure are yielded ahead of the error, and
/// after the error the stream is fused: no further items come out.
fn record_stream<S>(body: S) -> RecordStream
where
    S: Stream<Item = Result<Bytes, reqwest::Error>> + Send + 'static,
{
    let state = DecodeState {
        body: Box::pin(body),
        decoder: JsonArrayDecoder::new(),
        ready: VecDeque::new(),
        pending_error: None,
        finished: false,
    };

    futures::stream::unfold(state, |mut state| async move {
        loop {
            if let Some(record) = state.ready.pop_front() {
                return Some((Ok(record), state));
            }
            if let Some(e) = state.pending_error.take() {
                return Some((Err(e), state));
            }
            if state.finished {
                return None;
            }
            match state.body.next().await {
                Some(Ok(chunk)) => {
                    let mut batch = Vec::new();
                    let outcome = state.decoder.feed(&chunk, &mut batch);
                    state.ready.extend(batch);
                    if let Err(e) = outcome {
                        state.pending_error = Some(e);
                        state.finished = true;
                    }
                },
                Some(Err(e)) => {
                    state.finished = true;
                    return Some((Err(FetchError::Read(e.to_string())), state));
                },
                None => {
                    state.finished = true;
                    if let Err(e) = state.decoder.finish() {
                        return Some((Err(e), state));
                    }
                },
            }
        }
    })
    .boxed()
}
