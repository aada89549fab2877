//! Infrastructure layer
//!
//! Concrete adapters, configuration loading, caching and resilience
//! primitives behind the application's ports.

pub mod adapters;
pub mod cache;
pub mod config;
pub mod retry;

pub use adapters::ForecastSourceAdapter;
pub use cache::SingleFlightCache;
pub use config::AppConfig;
