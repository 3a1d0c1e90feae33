//! Basic Metrics
//!
//! Request counters and latency tracking, shared by the binary protocol and
//! the HTTP surface.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use hashbrown::HashMap;
use parking_lot::RwLock;

/// Metrics collector
#[derive(Debug)]
pub struct Metrics {
    /// Total requests served
    total_ops: AtomicU64,

    /// Requests per command name
    ops_by_command: RwLock<HashMap<String, u64>>,

    /// Queries for words outside the vocabulary
    unknown_words: AtomicU64,

    latency_sum_us: AtomicU64,
    latency_count: AtomicU64,
    latency_min_us: AtomicU64,
    latency_max_us: AtomicU64,
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

impl Metrics {
    pub fn new() -> Self {
        Self {
            total_ops: AtomicU64::new(0),
            ops_by_command: RwLock::new(HashMap::new()),
            unknown_words: AtomicU64::new(0),
            latency_sum_us: AtomicU64::new(0),
            latency_count: AtomicU64::new(0),
            latency_min_us: AtomicU64::new(u64::MAX),
            latency_max_us: AtomicU64::new(0),
        }
    }

    /// Record one served request
    pub fn record_operation(&self, command: &str, latency: Duration) {
        self.total_ops.fetch_add(1, Ordering::Relaxed);

        {
            let mut ops = self.ops_by_command.write();
            match ops.get_mut(command) {
                Some(count) => *count += 1,
                None => {
                    ops.insert(command.to_string(), 1);
                }
            }
        }

        let latency_us = latency.as_micros() as u64;
        self.latency_sum_us.fetch_add(latency_us, Ordering::Relaxed);
        self.latency_count.fetch_add(1, Ordering::Relaxed);
        self.latency_min_us.fetch_min(latency_us, Ordering::Relaxed);
        self.latency_max_us.fetch_max(latency_us, Ordering::Relaxed);
    }

    pub fn record_unknown_word(&self) {
        self.unknown_words.fetch_add(1, Ordering::Relaxed);
    }

    pub fn total_ops(&self) -> u64 {
        self.total_ops.load(Ordering::Relaxed)
    }

    pub fn unknown_words(&self) -> u64 {
        self.unknown_words.load(Ordering::Relaxed)
    }

    /// Snapshot of the per-command counters
    pub fn ops_by_command(&self) -> HashMap<String, u64> {
        self.ops_by_command.read().clone()
    }

    /// Average latency in microseconds
    pub fn avg_latency_us(&self) -> f64 {
        let count = self.latency_count.load(Ordering::Relaxed);
        if count == 0 {
            return 0.0;
        }
        let sum = self.latency_sum_us.load(Ordering::Relaxed);
        sum as f64 / count as f64
    }

    pub fn min_latency_us(&self) -> u64 {
        let min = self.latency_min_us.load(Ordering::Relaxed);
        if min == u64::MAX {
            0
        } else {
            min
        }
    }

    pub fn max_latency_us(&self) -> u64 {
        self.latency_max_us.load(Ordering::Relaxed)
    }

    pub fn summary(&self) -> String {
        format!(
            "Requests: {} (unknown words: {}) | Latency (µs): avg={:.1}, min={}, max={}",
            self.total_ops(),
            self.unknown_words(),
            self.avg_latency_us(),
            self.min_latency_us(),
            self.max_latency_us()
        )
    }
}
