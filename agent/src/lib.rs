//! # System Monitor Agent
//!
//! Samples host telemetry on a fixed timer and ships each snapshot to the
//! collector over HTTP.
//!
//! ## Architecture
//!
//! The pipeline is fully sequential, one cycle at a time:
//!
//! - **`config`**: Validated runtime configuration parsed from the CLI
//! - **`sources`**: Individual telemetry producers
//!   - **`SystemAdapter`**: CPU load and top-process sampling via sysinfo
//!   - **`GpuResolver`**: Tiered GPU load resolution with fallback
//! - **`sampler`**: Combines source readings into one timestamped snapshot,
//!   tolerating partial failures per source
//! - **`sender`**: Serializes a snapshot and POSTs it to the collector
//!
//! A failed delivery is dropped; the next cycle produces a fresh snapshot
//! regardless of the previous outcome. The agent values freshness over
//! completeness of history.

pub mod config;
pub mod sampler;
pub mod sender;
pub mod sources;

pub use config::AgentConfig;
pub use sampler::Assembler;
pub use sender::DeliveryClient;
