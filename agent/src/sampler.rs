//! Sample assembly: combine source readings into one snapshot.
//!
//! Assembly is total. Partial telemetry is preferred over no telemetry, so
//! any individual source failure is logged and collapsed to its zero value
//! here rather than propagated.

use crate::{
    config::AgentConfig,
    sources::{
        GpuResolver,
        HostMetrics,
        SystemAdapter,
    },
};
use chrono::Utc;
use system_monitor_model::Snapshot;
use tracing::warn;

pub struct Assembler {
    metrics: Box<dyn HostMetrics>,
    gpu: GpuResolver,
    top_processes: usize,
}

impl Assembler {
    pub fn new(metrics: Box<dyn HostMetrics>, gpu: GpuResolver, top_processes: usize) -> Self {
        Self {
            metrics,
            gpu,
            top_processes,
        }
    }

    /// The standard production wiring: local host metrics plus the default
    /// GPU strategy chain.
    pub fn from_config(config: &AgentConfig) -> Self {
        Self::new(
            Box::new(SystemAdapter::new()),
            GpuResolver::new(&config.monitor_service_url),
            config.top_processes,
        )
    }

    /// Produce one snapshot. Never fails; the timestamp is stamped exactly
    /// once, after all sources have reported.
    pub async fn assemble(&mut self) -> Snapshot {
        let cpu_load = match self.metrics.cpu_load().await {
            Ok(load) => load,
            Err(e) => {
                warn!(error = %e, "CPU sampling failed, substituting 0");
                0.0
            }
        };

        let gpu_load = match self.gpu.resolve().await {
            Ok(load) => load,
            Err(e) => {
                warn!(error = %e, "GPU resolution failed, substituting 0");
                0.0
            }
        };

        let top_processes = match self.metrics.top_processes(self.top_processes).await {
            Ok(processes) => processes,
            Err(e) => {
                warn!(error = %e, "process enumeration failed, substituting empty list");
                Vec::new()
            }
        };

        Snapshot {
            cpu_load,
            gpu_load,
            top_processes,
            timestamp: Utc::now(),
        }
    }
}
