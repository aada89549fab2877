//! Cache TTL configuration

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Aggregate cache configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Whether caching is enabled; disabling recomputes on every request
    pub enabled: bool,
    /// Lifetime of a cached aggregate in seconds
    pub ttl_secs: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            ttl_secs: 3,
        }
    }
}

impl CacheConfig {
    /// Cache entry lifetime.
    #[must_use]
    pub const fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_secs)
    }
}
