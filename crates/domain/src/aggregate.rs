//! Aggregated forecast statistics

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Summary statistics over a collection of forecast records.
///
/// Produced by a single pass over the record stream and immutable once
/// constructed. A value of this type always describes at least one sample;
/// an input with zero usable samples yields no `AggregatedInfo` at all.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AggregatedInfo {
    /// Earliest observed forecast date
    pub period_start: DateTime<Utc>,
    /// Latest observed forecast date
    pub period_end: DateTime<Utc>,
    /// Number of records that contributed a temperature sample
    pub forecast_samples: u64,
    /// Minimum observed temperature in Celsius
    pub min_temperature_c: i32,
    /// Minimum observed temperature in Fahrenheit (derived)
    pub min_temperature_f: i32,
    /// Truncated running mean temperature in Celsius
    pub avg_temperature_c: i32,
    /// Truncated running mean temperature in Fahrenheit (derived)
    pub avg_temperature_f: i32,
    /// Maximum observed temperature in Celsius
    pub max_temperature_c: i32,
    /// Maximum observed temperature in Fahrenheit (derived)
    pub max_temperature_f: i32,
    /// Space-joined top-3 most frequent summary words
    pub summary_words: String,
}
