//! Upstream forecast source settings

use integration_forecast::ForecastClientConfig;
use serde::{Deserialize, Serialize};

/// Configuration for the upstream forecast service
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct UpstreamConfig {
    /// Base URL of the forecast service
    pub base_url: String,
    /// Request timeout in seconds
    pub timeout_secs: u64,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:5000".to_string(),
            timeout_secs: 30,
        }
    }
}

impl UpstreamConfig {
    /// Convert to the forecast client's own configuration type.
    #[must_use]
    pub fn to_client_config(&self) -> ForecastClientConfig {
        ForecastClientConfig {
            base_url: self.base_url.clone(),
            timeout_secs: self.timeout_secs,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_values() {
        let config = UpstreamConfig::default();
        assert_eq!(config.base_url, "http://localhost:5000");
        assert_eq!(config.timeout_secs, 30);
    }

    #[test]
    fn converts_to_client_config() {
        let config = UpstreamConfig {
            base_url: "http://forecast:9000".to_string(),
            timeout_secs: 10,
        };
        let client_config = config.to_client_config();
        assert_eq!(client_config.base_url, "http://forecast:9000");
        assert_eq!(client_config.timeout_secs, 10);
    }
}
