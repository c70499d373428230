use std::{sync::Arc, time::SystemTime};

/// External supplier of raw load metrics. Getters may return any real
/// number; the observer clamps to [0, 1] before anyone else sees the value.
pub trait PressureSource: Send + Sync {
    fn memory_pressure(&self) -> f64;
    fn queue_depth_pressure(&self) -> f64;
    fn spawn_saturation(&self) -> f64;
}

/// Source reporting an idle system. Used when no metrics are wired up.
pub struct ZeroPressureSource;

impl PressureSource for ZeroPressureSource {
    fn memory_pressure(&self) -> f64 {
        0.0
    }

    fn queue_depth_pressure(&self) -> f64 {
        0.0
    }

    fn spawn_saturation(&self) -> f64 {
        0.0
    }
}

/// Point-in-time load snapshot, recomputed on every admission call and
/// never stored.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PressureSignal {
    pub memory: f64,
    pub queue_depth: f64,
    pub spawn_saturation: f64,
    pub timestamp: SystemTime,
}

impl PressureSignal {
    pub fn average(&self) -> f64 {
        (self.memory + self.queue_depth + self.spawn_saturation) / 3.0
    }
}

/// Pull-only view over a [`PressureSource`]. No caching, no callbacks:
/// each `snapshot` re-reads all three getters.
pub struct PressureObserver {
    source: Arc<dyn PressureSource>,
}

impl PressureObserver {
    pub fn new(source: Arc<dyn PressureSource>) -> Self {
        Self { source }
    }

    pub fn snapshot(&self) -> PressureSignal {
        PressureSignal {
            memory: clamp_unit(self.source.memory_pressure()),
            queue_depth: clamp_unit(self.source.queue_depth_pressure()),
            spawn_saturation: clamp_unit(self.source.spawn_saturation()),
            timestamp: SystemTime::now(),
        }
    }
}

fn clamp_unit(raw: f64) -> f64 {
    if raw.is_nan() { 0.0 } else { raw.clamp(0.0, 1.0) }
}
