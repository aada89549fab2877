//! Application services

mod aggregation_service;

pub use aggregation_service::{AggregationService, aggregate_stream};
