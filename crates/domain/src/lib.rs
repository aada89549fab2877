//! Domain layer for the forecast aggregation service
//!
//! Contains the forecast data model, the aggregate result shape, and the
//! temperature conversion logic. This layer has no I/O dependencies.

pub mod aggregate;
pub mod forecast;
pub mod temperature;

pub use aggregate::AggregatedInfo;
pub use forecast::ForecastRecord;
pub use temperature::{celsius_to_fahrenheit, celsius_to_fahrenheit_f64};
