//! The bounded-window aggregation store.
//!
//! The store is the collector's only shared mutable state. A single
//! reader-writer lock covers both the latest-snapshot slot and the history
//! ring, so readers always observe a consistent pre- or post-ingest view,
//! never a partial one.

use chrono::Utc;
use serde::Serialize;
use std::{
    sync::RwLock,
    time::Duration,
};
use system_monitor_model::Snapshot;

/// The history window holds at most this many snapshots; older entries are
/// evicted FIFO.
pub const HISTORY_CAPACITY: usize = 100;

/// Trailing span the metrics endpoint averages over.
pub const METRICS_WINDOW: Duration = Duration::from_secs(60);

/// Fixed-capacity circular buffer with head/length indices. Eviction is
/// O(1): the evicted slot is overwritten and the head advances.
struct Ring<T> {
    slots: Vec<Option<T>>,
    head: usize,
    len: usize,
}

impl<T> Ring<T> {
    fn with_capacity(capacity: usize) -> Self {
        assert!(capacity > 0, "ring capacity must be positive");
        Self {
            slots: (0..capacity).map(|_| None).collect(),
            head: 0,
            len: 0,
        }
    }

    fn capacity(&self) -> usize {
        self.slots.len()
    }

    fn len(&self) -> usize {
        self.len
    }

    /// Append, evicting the oldest entry when full.
    fn push(&mut self, item: T) {
        let capacity = self.capacity();
        if self.len < capacity {
            self.slots[(self.head + self.len) % capacity] = Some(item);
            self.len += 1;
        } else {
            self.slots[self.head] = Some(item);
            self.head = (self.head + 1) % capacity;
        }
    }

    /// Iterate oldest to newest.
    fn iter(&self) -> impl DoubleEndedIterator<Item = &T> + '_ {
        (0..self.len).map(move |i| {
            self.slots[(self.head + i) % self.capacity()]
                .as_ref()
                .expect("slot within the live range is occupied")
        })
    }
}

/// Averages over the snapshots inside a trailing window.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WindowAverages {
    pub avg_cpu_load: f64,
    pub avg_gpu_load: f64,
}

struct Inner {
    latest: Option<Snapshot>,
    history: Ring<Snapshot>,
}

/// Thread-safe store of ingested snapshots.
///
/// Constructed explicitly and shared via `Arc` so independent instances can
/// be exercised in isolation; there is no global store.
pub struct MonitorStore {
    inner: RwLock<Inner>,
}

impl MonitorStore {
    pub fn new() -> Self {
        Self::with_capacity(HISTORY_CAPACITY)
    }

    /// Capacity is parameterized for tests; the collector binary always
    /// uses [`HISTORY_CAPACITY`].
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            inner: RwLock::new(Inner {
                latest: None,
                history: Ring::with_capacity(capacity),
            }),
        }
    }

    /// Accept one snapshot: overwrite the latest slot and append to the
    /// history window, inside one critical section.
    pub fn ingest(&self, snapshot: Snapshot) {
        let mut inner = self.inner.write().expect("store lock poisoned");
        inner.latest = Some(snapshot.clone());
        inner.history.push(snapshot);
    }

    /// The most recently ingested snapshot, if any.
    pub fn latest(&self) -> Option<Snapshot> {
        self.inner.read().expect("store lock poisoned").latest.clone()
    }

    /// All retained snapshots, oldest first.
    pub fn history(&self) -> Vec<Snapshot> {
        self.inner
            .read()
            .expect("store lock poisoned")
            .history
            .iter()
            .cloned()
            .collect()
    }

    pub fn len(&self) -> usize {
        self.inner.read().expect("store lock poisoned").history.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Average CPU and GPU load over snapshots no older than `window`.
    ///
    /// Walks the history newest to oldest and stops at the first entry
    /// outside the window. Returns `None` when nothing falls inside it; an
    /// absent average is never conflated with a zero-valued one.
    pub fn windowed_average(&self, window: Duration) -> Option<WindowAverages> {
        let window = chrono::Duration::from_std(window).unwrap_or(chrono::Duration::MAX);
        let now = Utc::now();

        let inner = self.inner.read().expect("store lock poisoned");
        let mut cpu_sum = 0.0;
        let mut gpu_sum = 0.0;
        let mut count = 0u32;

        for snapshot in inner.history.iter().rev() {
            if now.signed_duration_since(snapshot.timestamp) > window {
                break;
            }
            cpu_sum += snapshot.cpu_load;
            gpu_sum += snapshot.gpu_load;
            count += 1;
        }

        if count == 0 {
            return None;
        }
        Some(WindowAverages {
            avg_cpu_load: cpu_sum / count as f64,
            avg_gpu_load: gpu_sum / count as f64,
        })
    }
}

impl Default for MonitorStore {
    fn default() -> Self {
        Self::new()
    }
}
