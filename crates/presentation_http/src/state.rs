//! Shared application state

use std::sync::Arc;

use application::{AggregationService, ForecastSourcePort};
use domain::AggregatedInfo;
use infrastructure::SingleFlightCache;
use infrastructure::config::CacheConfig;

/// State shared across request handlers.
#[derive(Clone)]
pub struct AppState {
    /// Aggregation use case
    pub aggregation: Arc<AggregationService>,
    /// Single-flight cache for computed aggregates
    pub cache: SingleFlightCache<Option<AggregatedInfo>>,
    /// Cache policy (enabled flag and TTL, reused for Cache-Control)
    pub cache_config: CacheConfig,
    /// Forecast source, used by readiness checks
    pub source: Arc<dyn ForecastSourcePort>,
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("cache_config", &self.cache_config)
            .finish_non_exhaustive()
    }
}

impl AppState {
    /// Assemble state from its parts.
    #[must_use]
    pub fn new(source: Arc<dyn ForecastSourcePort>, cache_config: CacheConfig) -> Self {
        Self {
            aggregation: Arc::new(AggregationService::new(Arc::clone(&source))),
            cache: SingleFlightCache::new(cache_config.ttl()),
            cache_config,
            source,
        }
    }
}
