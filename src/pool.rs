use std::sync::atomic::{AtomicU64, Ordering};

use crate::pressure::PressureSource;

/// Thin adapter from worker-pool gauges to the pressure interface. The
/// pool updates its gauges as work moves; the engine pulls ratios on each
/// admission call. Ratios are reported raw; the observer clamps them.
pub struct WorkerPoolPressure {
    memory_limit_bytes: u64,
    queue_capacity: u64,
    max_spawns: u64,
    memory_used_bytes: AtomicU64,
    queue_len: AtomicU64,
    live_spawns: AtomicU64,
}

impl WorkerPoolPressure {
    pub fn new(memory_limit_bytes: u64, queue_capacity: u64, max_spawns: u64) -> Self {
        Self {
            memory_limit_bytes: memory_limit_bytes.max(1),
            queue_capacity: queue_capacity.max(1),
            max_spawns: max_spawns.max(1),
            memory_used_bytes: AtomicU64::new(0),
            queue_len: AtomicU64::new(0),
            live_spawns: AtomicU64::new(0),
        }
    }

    pub fn set_memory_used_bytes(&self, used: u64) {
        self.memory_used_bytes.store(used, Ordering::Relaxed);
    }

    pub fn set_queue_len(&self, len: u64) {
        self.queue_len.store(len, Ordering::Relaxed);
    }

    pub fn set_live_spawns(&self, live: u64) {
        self.live_spawns.store(live, Ordering::Relaxed);
    }

    fn ratio(numerator: u64, denominator: u64) -> f64 {
        numerator as f64 / denominator as f64
    }
}

impl PressureSource for WorkerPoolPressure {
    fn memory_pressure(&self) -> f64 {
        Self::ratio(
            self.memory_used_bytes.load(Ordering::Relaxed),
            self.memory_limit_bytes,
        )
    }

    fn queue_depth_pressure(&self) -> f64 {
        Self::ratio(self.queue_len.load(Ordering::Relaxed), self.queue_capacity)
    }

    fn spawn_saturation(&self) -> f64 {
        Self::ratio(self.live_spawns.load(Ordering::Relaxed), self.max_spawns)
    }
}
