use std::{
    sync::Arc,
    time::{SystemTime, UNIX_EPOCH},
};

use uuid::Uuid;

use crate::{
    distributor::CircuitDistributor,
    envelope::{DecisionEnvelope, EnvelopeResolver},
    event::{DECISION_EVENT_SCHEMA_VERSION, DecisionEvent, DecisionEventSink, PressureReading},
    pressure::{PressureObserver, PressureSignal},
    registry::CandidateRegistry,
    store::EphemeralStateStore,
    types::{Decision, DropReason, Task, TaskRuntimeState},
};

/// Dropping for pressure is considered once the mean of the three metrics
/// passes this line, and only when the envelope allows dropping at all.
pub const PRESSURE_DROP_THRESHOLD: f64 = 0.9;

/// The admission-decision engine. One synchronous call per task: the task
/// proceeds to a destination or is dropped, and either way an event is
/// emitted. The engine never observes execution outcomes and holds no
/// state that correctness depends on.
pub struct AdmissionEngine {
    resolver: EnvelopeResolver,
    default_envelope: Arc<DecisionEnvelope>,
    store: EphemeralStateStore<TaskRuntimeState>,
    observer: PressureObserver,
    distributor: CircuitDistributor,
    registry: Arc<CandidateRegistry>,
    sinks: Vec<Arc<dyn DecisionEventSink>>,
}

impl std::fmt::Debug for AdmissionEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdmissionEngine")
            .field("default_envelope", &self.default_envelope.id)
            .field("registry_candidates", &self.registry.count())
            .field("store_capacity", &self.store.capacity())
            .field("sinks", &self.sinks.len())
            .finish_non_exhaustive()
    }
}

impl AdmissionEngine {
    pub fn new(
        resolver: EnvelopeResolver,
        default_envelope: Arc<DecisionEnvelope>,
        store: EphemeralStateStore<TaskRuntimeState>,
        observer: PressureObserver,
        distributor: CircuitDistributor,
        registry: Arc<CandidateRegistry>,
        sinks: Vec<Arc<dyn DecisionEventSink>>,
    ) -> Self {
        Self {
            resolver,
            default_envelope,
            store,
            observer,
            distributor,
            registry,
            sinks,
        }
    }

    /// Decides, in one synchronous pass, what happens to `task`. Never
    /// fails: every outcome for a well-formed task is a [`Decision`].
    pub fn admit(&self, task: &Task) -> Decision {
        let envelope = task
            .metadata
            .intent
            .as_deref()
            .and_then(|intent| self.resolver.resolve(intent))
            .unwrap_or_else(|| self.default_envelope.clone());

        let pressure = self.observer.snapshot();
        let state = self.store.mutate(&task.id, |state| state.clone());

        let decision = self.decide(task, &envelope, &state, &pressure);
        self.emit(task, &decision, &envelope, &pressure);
        decision
    }

    fn decide(
        &self,
        task: &Task,
        envelope: &DecisionEnvelope,
        state: &TaskRuntimeState,
        pressure: &PressureSignal,
    ) -> Decision {
        let depth = state.retry_depth;

        if state.spawn_count >= task.metadata.spawn_budget {
            return Decision::Drop {
                reason: DropReason::SpawnBudgetExhausted,
                current_depth: depth,
            };
        }

        if depth >= task.metadata.max_retry_depth {
            return Decision::Drop {
                reason: DropReason::RetryDepthExhausted,
                current_depth: depth,
            };
        }

        // Mask semantics: when the envelope forbids dropping, the pressure
        // gate is skipped entirely, whatever the reading says.
        if envelope.allow_drop && pressure.average() > PRESSURE_DROP_THRESHOLD {
            return Decision::Drop {
                reason: DropReason::PressureExceeded,
                current_depth: depth,
            };
        }

        let Some(group) = self.distributor.select(task, envelope, state, pressure) else {
            // Catch-all non-selection reason: empty eligible set or no
            // strategy matched.
            return Decision::Drop {
                reason: DropReason::SpawnBudgetExhausted,
                current_depth: depth,
            };
        };

        // Claim the spawn slot before dispatching so concurrent admissions
        // cannot push spawn_count past the budget.
        let budget = task.metadata.spawn_budget;
        let claimed = self.store.mutate(&task.id, |state| {
            if state.spawn_count >= budget {
                return false;
            }
            state.spawn_count += 1;
            state.last_attempt_at = Some(SystemTime::now());
            true
        });
        if !claimed {
            return Decision::Drop {
                reason: DropReason::SpawnBudgetExhausted,
                current_depth: depth,
            };
        }

        group.primary.dispatch(task);
        Decision::Dispatch
    }

    /// Advances retry depth for an existing entry. This is the only way
    /// retry depth moves: the engine never infers failure on its own.
    /// No-op when the entry already expired or was never admitted.
    pub fn signal_retry(&self, task_id: &str) {
        let advanced = self.store.mutate_existing(task_id, |state| {
            state.retry_depth = state.retry_depth.saturating_add(1);
        });
        if !advanced {
            tracing::trace!(task_id, "retry signal for unknown task ignored");
        }
    }

    /// Diagnostic accessor for a task's ephemeral counters.
    pub fn runtime_state(&self, task_id: &str) -> Option<TaskRuntimeState> {
        self.store.get(task_id)
    }

    pub fn store(&self) -> &EphemeralStateStore<TaskRuntimeState> {
        &self.store
    }

    fn emit(
        &self,
        task: &Task,
        decision: &Decision,
        envelope: &DecisionEnvelope,
        pressure: &PressureSignal,
    ) {
        let event = DecisionEvent {
            event_id: Uuid::now_v7().to_string(),
            task_id: task.id.clone(),
            decision: decision.clone(),
            envelope_id: envelope.id.clone(),
            envelope_narrowed: envelope.narrows(self.registry.count()),
            eligible_candidates_count: envelope.eligible_candidates.len(),
            pressure: PressureReading {
                memory: pressure.memory,
                queue_depth: pressure.queue_depth,
                spawn_saturation: pressure.spawn_saturation,
            },
            timestamp_ms: unix_millis(pressure.timestamp),
            schema_version: DECISION_EVENT_SCHEMA_VERSION.to_string(),
        };

        tracing::debug!(
            task_id = %event.task_id,
            envelope_id = %event.envelope_id,
            decision = ?event.decision,
            envelope_narrowed = event.envelope_narrowed,
            eligible_candidates = event.eligible_candidates_count,
            avg_pressure = pressure.average(),
            "admission decision"
        );

        for sink in &self.sinks {
            sink.on_event(&event);
        }
    }
}

fn unix_millis(at: SystemTime) -> u64 {
    at.duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_millis() as u64)
        .unwrap_or(0)
}
