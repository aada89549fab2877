//! Single-pass aggregation over a forecast record stream
//!
//! The fold maintains running date bounds, running min/max/mean temperature
//! and a summary frequency table, and produces the same result whether
//! records arrive in one batch or trickle in byte-by-byte upstream.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

use chrono::{DateTime, Utc};
use domain::{AggregatedInfo, ForecastRecord, celsius_to_fahrenheit, celsius_to_fahrenheit_f64};
use futures::StreamExt;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument};

use crate::error::ApplicationError;
use crate::ports::{ForecastSourcePort, ForecastStream};

/// How many summary words the aggregate reports.
const TOP_SUMMARY_WORDS: usize = 3;

/// Orchestrates one fetch-and-aggregate pass against the forecast source.
pub struct AggregationService {
    source: Arc<dyn ForecastSourcePort>,
}

impl std::fmt::Debug for AggregationService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AggregationService").finish_non_exhaustive()
    }
}

impl AggregationService {
    /// Create a service backed by the given forecast source.
    #[must_use]
    pub fn new(source: Arc<dyn ForecastSourcePort>) -> Self {
        Self { source }
    }

    /// Fetch the current forecast collection and aggregate it.
    ///
    /// Returns `Ok(None)` when the source produced no usable samples; this
    /// is a normal outcome, not an error.
    ///
    /// # Errors
    ///
    /// Propagates fetch and decode failures from the source, and
    /// `ApplicationError::Cancelled` when the token fires mid-stream.
    #[instrument(skip_all)]
    pub async fn aggregate_current(
        &self,
        cancel: &CancellationToken,
    ) -> Result<Option<AggregatedInfo>, ApplicationError> {
        let started = Instant::now();
        let stream = self.source.fetch_forecasts().await?;
        let result = aggregate_stream(stream, cancel).await?;

        metrics::counter!("aggregates_computed_total").increment(1);
        match &result {
            Some(info) => info!(
                samples = info.forecast_samples,
                elapsed_ms = started.elapsed().as_millis() as u64,
                "Aggregated forecast samples"
            ),
            None => info!(
                elapsed_ms = started.elapsed().as_millis() as u64,
                "Forecast source produced no usable samples"
            ),
        }

        Ok(result)
    }
}

/// Summary frequency table preserving first-seen order for tie-breaking.
#[derive(Debug, Default)]
struct SummaryTally {
    // (word, count) in first-encountered order
    entries: Vec<(String, u64)>,
    index: HashMap<String, usize>,
}

impl SummaryTally {
    fn record(&mut self, word: &str) {
        if let Some(&i) = self.index.get(word) {
            self.entries[i].1 += 1;
        } else {
            self.index.insert(word.to_string(), self.entries.len());
            self.entries.push((word.to_string(), 1));
        }
    }

    /// Top words by descending count; a stable sort keeps first-seen order
    /// for equal counts.
    fn top_words(mut self, n: usize) -> String {
        self.entries.sort_by_key(|(_, count)| std::cmp::Reverse(*count));
        self.entries
            .into_iter()
            .take(n)
            .map(|(word, _)| word)
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Consume a forecast stream exactly once, front-to-back.
///
/// Per-record policy, applied in order:
/// 1. no date: skip the whole record;
/// 2. date present: fold into the period bounds;
/// 3. no temperature: stop here (the record is not counted as a sample);
/// 4. temperature present: fold min/max and the running mean;
/// 5. non-empty summary: tally it;
/// 6. count the sample.
///
/// The running mean is recomputed incrementally as `(avg*n + x) / (n+1)` so
/// arbitrarily long streams cannot overflow an accumulator.
#[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation)]
pub async fn aggregate_stream(
    mut stream: ForecastStream,
    cancel: &CancellationToken,
) -> Result<Option<AggregatedInfo>, ApplicationError> {
    let mut count: u64 = 0;
    let mut date_min: Option<DateTime<Utc>> = None;
    let mut date_max: Option<DateTime<Utc>> = None;
    let mut temp_min = i32::MAX;
    let mut temp_max = i32::MIN;
    let mut temp_avg = 0f64;
    let mut summaries = SummaryTally::default();

    while let Some(item) = stream.next().await {
        if cancel.is_cancelled() {
            debug!("Aggregation cancelled mid-stream");
            return Err(ApplicationError::Cancelled);
        }

        let record: ForecastRecord = item?;

        let Some(date) = record.date else {
            continue;
        };
        if date_min.is_none_or(|min| date < min) {
            date_min = Some(date);
        }
        if date_max.is_none_or(|max| date > max) {
            date_max = Some(date);
        }

        let Some(temp) = record.temperature_c else {
            continue;
        };
        temp_min = temp_min.min(temp);
        temp_max = temp_max.max(temp);
        temp_avg = temp_avg.mul_add(count as f64, f64::from(temp)) / (count + 1) as f64;

        if let Some(summary) = record.summary.as_deref() {
            if !summary.is_empty() {
                summaries.record(summary);
            }
        }

        count += 1;
    }

    if count == 0 {
        return Ok(None);
    }

    let (Some(period_start), Some(period_end)) = (date_min, date_max) else {
        // Counted samples always carry a date, so the bounds must be set.
        return Err(ApplicationError::Internal(
            "aggregation counted samples without date bounds".to_string(),
        ));
    };

    let avg_c = temp_avg as i32;
    Ok(Some(AggregatedInfo {
        period_start,
        period_end,
        forecast_samples: count,
        min_temperature_c: temp_min,
        min_temperature_f: celsius_to_fahrenheit(temp_min),
        avg_temperature_c: avg_c,
        avg_temperature_f: celsius_to_fahrenheit_f64(temp_avg),
        max_temperature_c: temp_max,
        max_temperature_f: celsius_to_fahrenheit(temp_max),
        summary_words: summaries.top_words(TOP_SUMMARY_WORDS),
    }))
}
