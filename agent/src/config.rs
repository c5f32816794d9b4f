//! # Configuration Module
//!
//! Runtime configuration for the agent, built from CLI arguments.
//!
//! ## Configuration Fields
//!
//! - **Collector URL**: Base URL of the collector; snapshots go to
//!   `<base>/api/monitor`
//! - **Sampling interval**: Fixed inter-cycle sleep
//! - **Top processes**: How many processes a snapshot carries at most
//! - **Monitoring service URL**: Local sensor endpoint queried first for
//!   GPU load

use eyre::Result;
use std::time::Duration;

/// Snapshots are taken and delivered once per interval by default.
pub const DEFAULT_INTERVAL: Duration = Duration::from_secs(5);

/// Default length cap for the per-snapshot process list.
pub const DEFAULT_TOP_PROCESSES: usize = 10;

#[derive(Debug, Clone)]
pub struct AgentConfig {
    pub collector_url: String,
    pub interval: Duration,
    pub top_processes: usize,
    pub monitor_service_url: String,
}

impl AgentConfig {
    pub fn new(
        collector_url: String,
        interval: Duration,
        top_processes: usize,
        monitor_service_url: String,
    ) -> Result<Self> {
        let collector_url = Self::validate_base_url(&collector_url)?;

        Ok(Self {
            collector_url,
            interval,
            top_processes,
            monitor_service_url,
        })
    }

    /// Validate the collector base URL and strip any trailing slash so the
    /// endpoint path can be appended uniformly.
    fn validate_base_url(raw: &str) -> Result<String> {
        let url = url::Url::parse(raw).map_err(|e| eyre::eyre!("Invalid collector URL '{}': {}", raw, e))?;
        url.host_str()
            .ok_or_else(|| eyre::eyre!("No host found in collector URL: {}", raw))?;
        Ok(raw.trim_end_matches('/').to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn trailing_slash_is_stripped() {
        let config = AgentConfig::new(
            "http://localhost:8080/".to_string(),
            DEFAULT_INTERVAL,
            DEFAULT_TOP_PROCESSES,
            "http://localhost:8085/data.json".to_string(),
        )
        .unwrap();
        assert_eq!(config.collector_url, "http://localhost:8080");
    }

    #[test]
    fn collector_url_must_have_a_host() {
        assert!(AgentConfig::new(
            "not a url".to_string(),
            DEFAULT_INTERVAL,
            DEFAULT_TOP_PROCESSES,
            "http://localhost:8085/data.json".to_string(),
        )
        .is_err());
    }
}
