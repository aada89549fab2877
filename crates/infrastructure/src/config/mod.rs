//! Service configuration, layered from defaults, an optional file, and
//! `AGGREGATOR_*` environment variables.
//!
//! Sections:
//! - `server`: bind address and CORS
//! - `upstream`: forecast source location and timeouts
//! - `resilience`: retry and circuit breaker policy
//! - `cache`: aggregate cache TTL

mod cache;
mod resilience;
mod server;
mod upstream;

use serde::{Deserialize, Serialize};

pub use cache::CacheConfig;
pub use resilience::ResilienceConfig;
pub use server::ServerConfig;
pub use upstream::UpstreamConfig;

/// Top-level configuration for the aggregator service
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// HTTP server configuration
    pub server: ServerConfig,

    /// Upstream forecast source configuration
    pub upstream: UpstreamConfig,

    /// Retry and circuit breaker configuration
    pub resilience: ResilienceConfig,

    /// Aggregate cache configuration
    pub cache: CacheConfig,
}

impl AppConfig {
    /// Load configuration from an optional `config` file plus environment
    /// variables (e.g. `AGGREGATOR_SERVER_PORT`).
    ///
    /// # Errors
    ///
    /// Returns a `config::ConfigError` when a source is malformed or a value
    /// fails to deserialize.
    pub fn load() -> Result<Self, config::ConfigError> {
        let builder = config::Config::builder()
            .set_default("server.host", "127.0.0.1")?
            .set_default("server.port", 3000)?
            .set_default("upstream.base_url", "http://localhost:5000")?
            .add_source(config::File::with_name("config").required(false))
            .add_source(
                config::Environment::with_prefix("AGGREGATOR")
                    .separator("_")
                    .try_parsing(true),
            );

        let config = builder.build()?;
        config.try_deserialize()
    }
}
