//! Agent configuration.

use anyhow::Result;
use std::time::Duration;

/// Relay agent configuration.
#[derive(Debug, Clone)]
pub struct AgentConfig {
    /// Locator API base URL.
    pub api_url: String,

    /// gpsd endpoint (`host:port`).
    pub gpsd_addr: String,

    /// Target interval between location samples.
    pub poll_interval: Duration,

    /// Minimum spacing between two samples.
    pub min_interval: Duration,

    /// HTTP request timeout.
    pub http_timeout: Duration,
}

impl AgentConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self> {
        let api_url = std::env::var("LOCATOR_API_URL")
            .unwrap_or_else(|_| "https://souls.pythonanywhere.com/api".to_string());

        let gpsd_addr =
            std::env::var("LOCATOR_GPSD_ADDR").unwrap_or_else(|_| "127.0.0.1:2947".to_string());

        let poll_secs: u64 = std::env::var("LOCATOR_POLL_INTERVAL_SECS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(10);

        let min_secs: u64 = std::env::var("LOCATOR_MIN_INTERVAL_SECS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(5);

        let timeout_secs: u64 = std::env::var("LOCATOR_HTTP_TIMEOUT_SECS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(30);

        Ok(Self {
            api_url,
            gpsd_addr,
            poll_interval: Duration::from_secs(poll_secs),
            min_interval: Duration::from_secs(min_secs),
            http_timeout: Duration::from_secs(timeout_secs),
        })
    }
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            api_url: "https://souls.pythonanywhere.com/api".to_string(),
            gpsd_addr: "127.0.0.1:2947".to_string(),
            poll_interval: Duration::from_secs(10),
            min_interval: Duration::from_secs(5),
            http_timeout: Duration::from_secs(30),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_default() {
        let config = AgentConfig::default();
        assert_eq!(config.poll_interval, Duration::from_secs(10));
        assert_eq!(config.min_interval, Duration::from_secs(5));
        assert_eq!(config.gpsd_addr, "127.0.0.1:2947");
    }

    #[test]
    fn test_min_interval_not_above_target() {
        let config = AgentConfig::default();
        assert!(config.min_interval <= config.poll_interval);
    }
}
