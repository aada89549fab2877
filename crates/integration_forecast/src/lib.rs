//! Forecast source integration
//!
//! HTTP client for the remote weather forecast endpoint. The response body
//! is consumed incrementally: records are decoded from the JSON array as
//! the bytes arrive, without ever materializing the whole payload.

pub mod client;
pub mod decode;
pub mod error;

pub use client::{ForecastClient, ForecastClientConfig, RecordStream};
pub use decode::JsonArrayDecoder;
pub use error::FetchError;
