//! Application layer - use cases and orchestration
//!
//! Defines the port through which forecast records are fetched and the
//! single-pass aggregation over the resulting record stream.

pub mod error;
pub mod ports;
pub mod services;

pub use error::ApplicationError;
pub use ports::{ForecastSourcePort, ForecastStream};
pub use services::{AggregationService, aggregate_stream};
