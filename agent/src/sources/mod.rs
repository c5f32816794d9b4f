//! Telemetry sources: the host metric adapter and the GPU load resolver.
//!
//! Every source reports failure through [`SourceError`]. Source failures
//! never abort a sampling cycle; the assembler logs them and substitutes
//! zero values.

mod gpu;
mod system;

pub use gpu::{
    GpuResolver,
    GpuStrategy,
    MonitorServiceStrategy,
    PerfCounterStrategy,
};
pub use system::{
    rank_processes,
    SystemAdapter,
};

use std::{
    future::Future,
    pin::Pin,
    time::Duration,
};
use system_monitor_model::ProcessSample;

/// Failure modes of the individual telemetry sources.
#[derive(thiserror::Error, Debug)]
pub enum SourceError {
    #[error("monitoring service request failed: {0}")]
    ServiceRequest(#[from] reqwest::Error),
    #[error("monitoring service returned status {0}")]
    ServiceStatus(reqwest::StatusCode),
    #[error("no GPU load sensor in monitoring service response")]
    SensorNotFound,
    #[error("counter query could not be spawned: {0}")]
    CounterSpawn(#[from] std::io::Error),
    #[error("counter query exited with {0}")]
    CounterStatus(std::process::ExitStatus),
    #[error("counter query timed out after {0:?}")]
    CounterTimeout(Duration),
    #[error("counter query produced no output")]
    CounterEmptyOutput,
    #[error("counter query output is not numeric: {0:?}")]
    CounterNotNumeric(String),
    #[error("no CPU cores reported by the system")]
    NoCpuData,
    #[error("all GPU strategies failed: {0}")]
    Exhausted(String),
}

/// Seam over the host metric adapter so the assembler can be exercised with
/// stub sources.
pub trait HostMetrics: Send {
    /// Sample aggregate CPU utilization. Blocks the cycle for the sampling
    /// window; an instantaneous reading would be meaningless.
    fn cpu_load(&mut self) -> Pin<Box<dyn Future<Output = Result<f64, SourceError>> + Send + '_>>;

    /// Enumerate live processes and return the heaviest by CPU usage,
    /// descending, at most `limit` entries.
    fn top_processes(
        &mut self,
        limit: usize,
    ) -> Pin<Box<dyn Future<Output = Result<Vec<ProcessSample>, SourceError>> + Send + '_>>;
}
