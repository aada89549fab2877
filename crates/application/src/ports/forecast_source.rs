//! Forecast source port
//!
//! Defines the interface for fetching the remote forecast record stream.
//! Each call produces a fresh, forward-only, finite sequence of records;
//! the consumer pulls one record at a time and may stop mid-sequence.

use async_trait::async_trait;
use domain::ForecastRecord;
use futures::stream::BoxStream;
#[cfg(test)]
use mockall::automock;

use crate::error::ApplicationError;

/// A lazily-produced sequence of forecast records.
///
/// Yielding an `Err` item terminates the sequence: the fetch has failed as
/// a whole and already-yielded records must not be treated as a result.
pub type ForecastStream = BoxStream<'static, Result<ForecastRecord, ApplicationError>>;

/// Port for the remote forecast data source.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait ForecastSourcePort: Send + Sync {
    /// Start one fetch against the forecast source.
    ///
    /// Resilience policy (retry, circuit breaking, timeouts) is applied by
    /// the implementation before the stream is handed out; errors yielded
    /// by the stream itself are final.
    async fn fetch_forecasts(&self) -> Result<ForecastStream, ApplicationError>;

    /// Whether the source is currently believed to be reachable.
    async fn is_available(&self) -> bool;
}
