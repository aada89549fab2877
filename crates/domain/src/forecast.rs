//! Forecast record as consumed from the remote data source

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::temperature::celsius_to_fahrenheit;

/// A single weather forecast sample.
///
/// All fields are optional because the remote payload may omit or null any
/// of them; a record missing a field simply contributes nothing to the
/// corresponding statistic. A `date` that is present but unparsable is a
/// payload error, which serde surfaces as a deserialization failure.
///
/// The upstream also transmits a `temperatureF` field; it is never trusted
/// and is ignored on deserialization (Fahrenheit is always derived locally).
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ForecastRecord {
    /// Timestamp of the forecast sample
    #[serde(default)]
    pub date: Option<DateTime<Utc>>,

    /// Temperature in Celsius
    #[serde(default)]
    pub temperature_c: Option<i32>,

    /// Free-form summary word
    #[serde(default)]
    pub summary: Option<String>,
}

impl ForecastRecord {
    /// Derived Fahrenheit temperature, when a Celsius value is present.
    #[must_use]
    pub fn temperature_f(&self) -> Option<i32> {
        self.temperature_c.map(celsius_to_fahrenheit)
    }
}
