//! Host metric adapter: CPU load and top-process sampling via sysinfo.

use crate::sources::{
    HostMetrics,
    SourceError,
};
use std::{
    future::Future,
    pin::Pin,
    time::Duration,
};
use sysinfo::{
    ProcessesToUpdate,
    System,
};
use system_monitor_model::ProcessSample;

/// CPU usage is a delta between two refreshes; this is how long we let the
/// counters move in between. Instantaneous sampling is not meaningful.
const SAMPLE_WINDOW: Duration = Duration::from_millis(500);

/// Processes below this CPU share are measurement noise and are dropped
/// before ranking.
const MIN_CPU_PERCENT: f64 = 0.1;

/// Samples CPU utilization and the process table from the local host.
///
/// Owns the [`sysinfo::System`] handle so successive refreshes can diff
/// against the previous reading.
pub struct SystemAdapter {
    sys: System,
}

impl SystemAdapter {
    pub fn new() -> Self {
        Self { sys: System::new() }
    }

    async fn sample_cpu(&mut self) -> Result<f64, SourceError> {
        self.sys.refresh_cpu_usage();
        tokio::time::sleep(SAMPLE_WINDOW.max(sysinfo::MINIMUM_CPU_UPDATE_INTERVAL)).await;
        self.sys.refresh_cpu_usage();

        let cpus = self.sys.cpus();
        if cpus.is_empty() {
            return Err(SourceError::NoCpuData);
        }
        let total: f64 = cpus.iter().map(|c| c.cpu_usage() as f64).sum();
        Ok(total / cpus.len() as f64)
    }

    async fn sample_processes(&mut self, limit: usize) -> Result<Vec<ProcessSample>, SourceError> {
        // Two refresh passes so per-process CPU deltas are meaningful.
        self.sys.refresh_processes(ProcessesToUpdate::All, true);
        tokio::time::sleep(SAMPLE_WINDOW.max(sysinfo::MINIMUM_CPU_UPDATE_INTERVAL)).await;
        self.sys.refresh_processes(ProcessesToUpdate::All, true);

        let samples: Vec<ProcessSample> = self
            .sys
            .processes()
            .iter()
            .map(|(pid, process)| ProcessSample {
                name: process.name().to_string_lossy().to_string(),
                pid: pid.as_u32(),
                cpu_percent: process.cpu_usage() as f64,
            })
            .collect();

        Ok(rank_processes(samples, limit))
    }
}

impl Default for SystemAdapter {
    fn default() -> Self {
        Self::new()
    }
}

impl HostMetrics for SystemAdapter {
    fn cpu_load(&mut self) -> Pin<Box<dyn Future<Output = Result<f64, SourceError>> + Send + '_>> {
        Box::pin(self.sample_cpu())
    }

    fn top_processes(
        &mut self,
        limit: usize,
    ) -> Pin<Box<dyn Future<Output = Result<Vec<ProcessSample>, SourceError>> + Send + '_>> {
        Box::pin(self.sample_processes(limit))
    }
}

/// Rank raw process samples: drop unnamed entries and entries under the
/// noise floor, sort descending by CPU usage, truncate to `limit`.
pub fn rank_processes(samples: Vec<ProcessSample>, limit: usize) -> Vec<ProcessSample> {
    let mut ranked: Vec<ProcessSample> = samples
        .into_iter()
        .filter(|s| !s.name.is_empty() && s.cpu_percent >= MIN_CPU_PERCENT)
        .collect();

    ranked.sort_by(|a, b| {
        b.cpu_percent
            .partial_cmp(&a.cpu_percent)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    ranked.truncate(limit);
    ranked
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn sample(name: &str, pid: u32, cpu_percent: f64) -> ProcessSample {
        ProcessSample {
            name: name.to_string(),
            pid,
            cpu_percent,
        }
    }

    #[test]
    fn noise_floor_is_inclusive_at_the_threshold() {
        let ranked = rank_processes(
            vec![
                sample("idle", 1, 0.05),
                sample("editor", 2, 0.1),
                sample("compiler", 3, 5.0),
            ],
            10,
        );
        assert_eq!(ranked, vec![sample("compiler", 3, 5.0), sample("editor", 2, 0.1)]);
    }

    #[test]
    fn unnamed_processes_are_skipped() {
        let ranked = rank_processes(vec![sample("", 1, 50.0), sample("worker", 2, 1.0)], 10);
        assert_eq!(ranked, vec![sample("worker", 2, 1.0)]);
    }

    #[test]
    fn result_is_truncated_to_limit() {
        let samples = (0..20u32).map(|i| sample("proc", i, 1.0 + i as f64)).collect();
        let ranked = rank_processes(samples, 10);
        assert_eq!(ranked.len(), 10);
        assert_eq!(ranked[0].cpu_percent, 20.0);
        assert_eq!(ranked[9].cpu_percent, 11.0);
    }

    #[tokio::test]
    async fn cpu_load_reports_a_finite_percentage() {
        let mut adapter = SystemAdapter::new();
        let load = adapter.cpu_load().await.unwrap();
        assert!(load.is_finite());
        assert!(load >= 0.0);
    }
}
