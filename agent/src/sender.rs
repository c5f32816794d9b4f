//! Delivery of assembled snapshots to the collector.
//!
//! One POST per cycle, bounded timeout, no retry and no queue. A failed
//! delivery is dropped; the next cycle sends a fresh snapshot.

use std::time::Duration;
use system_monitor_model::Snapshot;

const DELIVERY_TIMEOUT: Duration = Duration::from_secs(10);
const MONITOR_ENDPOINT: &str = "/api/monitor";

#[derive(thiserror::Error, Debug)]
pub enum DeliveryError {
    #[error("delivery request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("collector returned status {0}")]
    Status(reqwest::StatusCode),
}

pub struct DeliveryClient {
    client: reqwest::Client,
    endpoint: String,
}

impl DeliveryClient {
    pub fn new(collector_url: &str) -> Result<Self, DeliveryError> {
        let client = reqwest::Client::builder()
            .timeout(DELIVERY_TIMEOUT)
            .user_agent(concat!("system-monitor-agent/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            client,
            endpoint: format!("{collector_url}{MONITOR_ENDPOINT}"),
        })
    }

    /// Serialize the snapshot and POST it. Serialization failure, connection
    /// failure, timeout, and non-success status are all delivery failures.
    pub async fn deliver(&self, snapshot: &Snapshot) -> Result<(), DeliveryError> {
        let response = self.client.post(&self.endpoint).json(snapshot).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(DeliveryError::Status(status));
        }
        Ok(())
    }
}
