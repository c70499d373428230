use std::sync::{Mutex, MutexGuard};

use serde::{Deserialize, Serialize};

use crate::types::{Decision, EnvelopeId, TaskId};

/// Decision event schema version. Additive optional fields bump the minor
/// version; removing, renaming, retyping, or re-scoping a field bumps the
/// major version. Consumers must ignore unknown fields and fail closed
/// (log, not crash) on an unsupported major version.
pub const DECISION_EVENT_SCHEMA_VERSION: &str = "1.0";

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PressureReading {
    pub memory: f64,
    pub queue_depth: f64,
    pub spawn_saturation: f64,
}

/// Observability record emitted on every admission path, dispatch and
/// drop alike. No decision is silent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecisionEvent {
    pub event_id: String,
    pub task_id: TaskId,
    pub decision: Decision,
    pub envelope_id: EnvelopeId,
    pub envelope_narrowed: bool,
    pub eligible_candidates_count: usize,
    pub pressure: PressureReading,
    pub timestamp_ms: u64,
    pub schema_version: String,
}

impl DecisionEvent {
    /// Whether a consumer built against the current schema can read an
    /// event stamped with `version` (same major).
    pub fn supported_version(version: &str) -> bool {
        match (schema_major(version), schema_major(DECISION_EVENT_SCHEMA_VERSION)) {
            (Some(theirs), Some(ours)) => theirs == ours,
            _ => false,
        }
    }
}

fn schema_major(version: &str) -> Option<u32> {
    version.split('.').next()?.parse().ok()
}

pub trait DecisionEventSink: Send + Sync {
    fn on_event(&self, event: &DecisionEvent);
}

/// In-memory sink for tests and demos.
#[derive(Default)]
pub struct RecordingSink {
    events: Mutex<Vec<DecisionEvent>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<DecisionEvent> {
        self.lock().clone()
    }

    pub fn take(&self) -> Vec<DecisionEvent> {
        std::mem::take(&mut *self.lock())
    }

    fn lock(&self) -> MutexGuard<'_, Vec<DecisionEvent>> {
        self.events.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl DecisionEventSink for RecordingSink {
    fn on_event(&self, event: &DecisionEvent) {
        self.lock().push(event.clone());
    }
}
