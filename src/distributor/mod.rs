pub mod intent;
pub mod penalty;
pub mod priority;
pub mod random;
pub mod strategy;

use std::{collections::HashMap, sync::Arc};

use crate::{
    envelope::DecisionEnvelope,
    pressure::PressureSignal,
    registry::{CandidateRegistry, SubRoutine},
    types::{IntentKey, Task, TaskRuntimeState},
};

pub use intent::IntentStrategy;
pub use penalty::{PenaltyStrategy, PenaltyTracker};
pub use priority::{PriorityBand, PriorityStrategy};
pub use random::{RandomSource, RandomStrategy, ThreadRngSource};
pub use strategy::{SelectionContext, SpawnStrategy, StrategyChain};

pub const DEFAULT_COOP_UNIT: f64 = 1.0;
pub const DEFAULT_MAX_COOPERATIVE: usize = 2;
/// Hard ceiling on cooperative carriers; not configurable.
pub const COOPERATIVE_CEILING: usize = 4;

/// Deterministic sizing of the cooperative carrier set. Expected load is
/// the intent's static cost scaled up by pressure and retry depth; every
/// full `coop_unit` of load adds one cooperative, up to the configured
/// maximum and the absolute ceiling.
pub struct CooperativePolicy {
    coop_unit: f64,
    max_cooperative: usize,
    intent_costs: HashMap<IntentKey, f64>,
    default_cost: f64,
}

impl Default for CooperativePolicy {
    fn default() -> Self {
        Self {
            coop_unit: DEFAULT_COOP_UNIT,
            max_cooperative: DEFAULT_MAX_COOPERATIVE,
            intent_costs: HashMap::new(),
            default_cost: 1.0,
        }
    }
}

impl CooperativePolicy {
    pub fn new(
        coop_unit: f64,
        max_cooperative: usize,
        intent_costs: HashMap<IntentKey, f64>,
        default_cost: f64,
    ) -> Self {
        Self {
            coop_unit: if coop_unit > 0.0 { coop_unit } else { DEFAULT_COOP_UNIT },
            max_cooperative: max_cooperative.min(COOPERATIVE_CEILING),
            intent_costs,
            default_cost,
        }
    }

    pub fn expected_load(&self, intent: Option<&str>, pressure: f64, retry_depth: u32) -> f64 {
        let static_cost = intent
            .and_then(|key| self.intent_costs.get(key).copied())
            .unwrap_or(self.default_cost);
        static_cost * (1.0 + pressure) * (1.0 + f64::from(retry_depth) * 0.5)
    }

    pub fn cooperative_count(
        &self,
        allow_cooperate: bool,
        intent: Option<&str>,
        pressure: f64,
        retry_depth: u32,
    ) -> usize {
        if !allow_cooperate {
            return 0;
        }
        let load = self.expected_load(intent, pressure, retry_depth);
        let raw = (load / self.coop_unit).floor();
        if raw <= 0.0 {
            return 0;
        }
        (raw as usize)
            .min(self.max_cooperative)
            .min(COOPERATIVE_CEILING)
    }
}

/// Result of a selection: exactly one primary with dispatch authority and
/// zero or more cooperatives that share transport pressure but never
/// dispatch and never compete for commit.
pub struct SubRoutineGroup {
    pub primary: Arc<dyn SubRoutine>,
    pub cooperatives: Vec<Arc<dyn SubRoutine>>,
}

/// Applies envelope-level destination filtering, then delegates to the
/// strategy chain. Strategies only ever see the pre-filtered eligible
/// list; the envelope's flags stop here.
pub struct CircuitDistributor {
    chain: StrategyChain,
    cooperative: CooperativePolicy,
    registry: Arc<CandidateRegistry>,
}

impl CircuitDistributor {
    pub fn new(
        chain: StrategyChain,
        cooperative: CooperativePolicy,
        registry: Arc<CandidateRegistry>,
    ) -> Self {
        Self {
            chain,
            cooperative,
            registry,
        }
    }

    pub fn select(
        &self,
        task: &Task,
        envelope: &DecisionEnvelope,
        runtime_state: &TaskRuntimeState,
        pressure: &PressureSignal,
    ) -> Option<SubRoutineGroup> {
        // Policy-level short-circuit: an empty eligible set admits nothing,
        // regardless of how the chain is configured.
        if envelope.eligible_candidates.is_empty() {
            return None;
        }

        let ctx = SelectionContext {
            task,
            runtime_state,
            pressure,
            eligible: &envelope.eligible_candidates,
        };
        let primary_id = self.chain.select(&ctx, envelope.allow_history_influence)?;
        let primary = self.registry.get(&primary_id)?.instantiate();

        let wanted = self.cooperative.cooperative_count(
            envelope.allow_cooperate,
            task.metadata.intent.as_deref(),
            pressure.average(),
            runtime_state.retry_depth,
        );
        let cooperatives = envelope
            .eligible_candidates
            .iter()
            .filter(|candidate| **candidate != primary_id)
            .filter_map(|candidate| self.registry.get(candidate))
            .map(|profile| profile.instantiate())
            .take(wanted)
            .collect();

        Some(SubRoutineGroup {
            primary,
            cooperatives,
        })
    }
}
