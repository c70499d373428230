use std::{fmt, time::SystemTime};

use serde::{Deserialize, Serialize};

pub type TaskId = String;
pub type CandidateId = String;
pub type EnvelopeId = String;
pub type IntentKey = String;

pub const MAX_PRIORITY: u8 = 100;

/// Opaque unit of intent. The engine reads the metadata and never mutates
/// the task; payload (if any) belongs to the destination, not to admission.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub id: TaskId,
    pub metadata: TaskMetadata,
}

impl Task {
    pub fn new(id: impl Into<TaskId>, metadata: TaskMetadata) -> Self {
        Self {
            id: id.into(),
            metadata,
        }
    }
}

/// Immutable contract limits, fixed at task creation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskMetadata {
    pub intent: Option<IntentKey>,
    pub priority: Option<u8>,
    pub spawn_budget: u32,
    pub max_retry_depth: u32,
    pub created_at: SystemTime,
}

impl TaskMetadata {
    pub fn new(spawn_budget: u32, max_retry_depth: u32) -> Self {
        Self {
            intent: None,
            priority: None,
            spawn_budget,
            max_retry_depth,
            created_at: SystemTime::now(),
        }
    }

    pub fn with_intent(mut self, intent: impl Into<IntentKey>) -> Self {
        self.intent = Some(intent.into());
        self
    }

    pub fn with_priority(mut self, priority: u8) -> Self {
        self.priority = Some(priority.min(MAX_PRIORITY));
        self
    }
}

/// Ephemeral per-task accounting. Lives in the state store; absence always
/// means "fresh, zero-state task", so losing an entry is never an error.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TaskRuntimeState {
    pub spawn_count: u32,
    pub retry_depth: u32,
    pub last_attempt_at: Option<SystemTime>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DropReason {
    SpawnBudgetExhausted,
    RetryDepthExhausted,
    PressureExceeded,
}

impl DropReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            DropReason::SpawnBudgetExhausted => "spawn_budget_exhausted",
            DropReason::RetryDepthExhausted => "retry_depth_exhausted",
            DropReason::PressureExceeded => "pressure_exceeded",
        }
    }
}

impl fmt::Display for DropReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Admission verdict, computed fresh per call and never persisted.
///
/// `Retry` and `Escalate` are part of the published decision schema but are
/// not produced by the current admission algorithm; they are reserved for
/// policy extensions that introduce their trigger conditions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Decision {
    Dispatch,
    Retry { current_depth: u32 },
    Escalate { current_depth: u32 },
    Drop { reason: DropReason, current_depth: u32 },
}

impl Decision {
    pub fn drop_reason(&self) -> Option<DropReason> {
        match self {
            Decision::Drop { reason, .. } => Some(*reason),
            _ => None,
        }
    }

    pub fn is_dispatch(&self) -> bool {
        matches!(self, Decision::Dispatch)
    }
}
