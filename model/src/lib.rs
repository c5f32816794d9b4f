//! # Wire Types
//!
//! Data structures shared between the agent and the collector. The JSON
//! field names are the wire contract; both sides serialize through these
//! types, so a change here is a protocol change.

use chrono::{
    DateTime,
    Utc,
};
use serde::{
    Deserialize,
    Serialize,
};

/// One timestamped telemetry reading bundling CPU, GPU, and process data.
///
/// A snapshot is assembled once by the agent and never mutated afterwards.
/// Percentages are best-effort: a source that failed to report collapses to
/// `0.0` at assembly time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    /// Aggregate CPU utilization across all cores, 0-100.
    pub cpu_load: f64,
    /// GPU core utilization, 0-100.
    pub gpu_load: f64,
    /// Heaviest processes by CPU usage, descending, at most ten by default.
    pub top_processes: Vec<ProcessSample>,
    /// Assembly instant, RFC3339 on the wire.
    pub timestamp: DateTime<Utc>,
}

/// A single process observed in a snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcessSample {
    pub name: String,
    pub pid: u32,
    pub cpu_percent: f64,
}
