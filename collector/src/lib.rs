//! # System Monitor Collector
//!
//! Accepts telemetry snapshots from agents over HTTP and keeps a bounded
//! rolling window of them in memory for retrieval and aggregation.
//!
//! - **`store`**: Thread-safe bounded ring buffer of snapshots with
//!   latest-snapshot, full-history, and time-windowed-average queries
//! - **`router`**: The axum HTTP surface over an injected store
//! - **`error`**: Boundary error type for rejected requests

pub mod error;
pub mod router;
pub mod store;

pub use router::create_router;
pub use store::MonitorStore;
