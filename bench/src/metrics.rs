//! Latency and throughput counters shared by the worker threads

use std::sync::atomic::{AtomicU64, Ordering};

/// Power-of-two latency buckets: bucket `i` counts samples below `2^i` ns
const BUCKETS: usize = 40;

pub struct Metrics {
    ops_count: AtomicU64,
    errors: AtomicU64,
    latency_sum: AtomicU64,
    latency_max: AtomicU64,
    histogram: [AtomicU64; BUCKETS],
}

impl Metrics {
    pub fn new() -> Self {
        Self {
            ops_count: AtomicU64::new(0),
            errors: AtomicU64::new(0),
            latency_sum: AtomicU64::new(0),
            latency_max: AtomicU64::new(0),
            histogram: std::array::from_fn(|_| AtomicU64::new(0)),
        }
    }

    pub fn record_op(&self, latency_ns: u64) {
        self.ops_count.fetch_add(1, Ordering::Relaxed);
        self.latency_sum.fetch_add(latency_ns, Ordering::Relaxed);
        self.latency_max.fetch_max(latency_ns, Ordering::Relaxed);

        let bucket = (u64::BITS - latency_ns.leading_zeros()) as usize;
        self.histogram[bucket.min(BUCKETS - 1)].fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_error(&self) {
        self.errors.fetch_add(1, Ordering::Relaxed);
    }

    pub fn total_ops(&self) -> u64 {
        self.ops_count.load(Ordering::Relaxed)
    }

    pub fn total_errors(&self) -> u64 {
        self.errors.load(Ordering::Relaxed)
    }

    pub fn total_latency_ns(&self) -> u64 {
        self.latency_sum.load(Ordering::Relaxed)
    }

    pub fn max_latency_ns(&self) -> u64 {
        self.latency_max.load(Ordering::Relaxed)
    }

    /// Upper bound of the bucket holding the given percentile, in ns
    pub fn percentile_ns(&self, percentile: f64) -> u64 {
        let total = self.total_ops();
        if total == 0 {
            return 0;
        }
        let target = ((total as f64) * percentile / 100.0).ceil() as u64;
        let mut seen = 0;
        for (bucket, count) in self.histogram.iter().enumerate() {
            seen += count.load(Ordering::Relaxed);
            if seen >= target {
                return 1u64 << bucket;
            }
        }
        self.max_latency_ns()
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}
