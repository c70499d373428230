use std::{
    collections::{HashMap, HashSet},
    fs,
    path::Path,
    sync::Arc,
    time::Duration,
};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::{
    decay::{DEFAULT_HALF_LIFE_MS, ForgettingCurve},
    distributor::{
        CircuitDistributor, CooperativePolicy, DEFAULT_COOP_UNIT, DEFAULT_MAX_COOPERATIVE,
        IntentStrategy, PenaltyStrategy, PenaltyTracker, PriorityBand, PriorityStrategy,
        RandomSource, RandomStrategy, SpawnStrategy, StrategyChain, ThreadRngSource,
    },
    engine::AdmissionEngine,
    envelope::{DecisionEnvelope, EnvelopeResolver},
    error::{
        ConfigError, empty_strategy_chain, invalid_value, missing_default_envelope,
        unknown_candidate, unknown_envelope,
    },
    event::DecisionEventSink,
    pressure::{PressureObserver, PressureSource},
    registry::CandidateRegistry,
    store::EphemeralStateStore,
    types::TaskRuntimeState,
};

fn default_store_capacity() -> usize {
    1_024
}

fn default_store_ttl_ms() -> u64 {
    600_000
}

fn default_penalty_half_life_ms() -> f64 {
    DEFAULT_HALF_LIFE_MS
}

fn default_max_acceptable_penalty() -> f64 {
    10.0
}

fn default_coop_unit() -> f64 {
    DEFAULT_COOP_UNIT
}

fn default_max_cooperative() -> usize {
    DEFAULT_MAX_COOPERATIVE
}

fn default_intent_cost() -> f64 {
    1.0
}

fn default_true() -> bool {
    true
}

/// Whole-engine configuration. Everything here is fixed once the engine
/// is built; nothing is re-read at admission time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    #[serde(default = "default_store_capacity")]
    pub store_capacity: usize,
    #[serde(default = "default_store_ttl_ms")]
    pub store_ttl_ms: u64,
    #[serde(default)]
    pub envelopes: Vec<EnvelopeConfig>,
    /// Id of the mandatory default envelope. Build fails without it.
    #[serde(default)]
    pub default_envelope: Option<String>,
    #[serde(default)]
    pub strategies: StrategyChainConfig,
    #[serde(default)]
    pub cooperative: CooperativeConfig,
    #[serde(default = "default_penalty_half_life_ms")]
    pub penalty_half_life_ms: f64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            store_capacity: default_store_capacity(),
            store_ttl_ms: default_store_ttl_ms(),
            envelopes: Vec::new(),
            default_envelope: None,
            strategies: StrategyChainConfig::default(),
            cooperative: CooperativeConfig::default(),
            penalty_half_life_ms: default_penalty_half_life_ms(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnvelopeConfig {
    pub id: String,
    /// Intents this envelope answers for. The default envelope may leave
    /// this empty.
    #[serde(default)]
    pub intents: Vec<String>,
    #[serde(default = "default_true")]
    pub allow_drop: bool,
    #[serde(default = "default_true")]
    pub allow_retry: bool,
    #[serde(default = "default_true")]
    pub allow_cooperate: bool,
    #[serde(default = "default_true")]
    pub allow_history_influence: bool,
    #[serde(default)]
    pub eligible_candidates: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StrategyChainConfig {
    #[serde(default)]
    pub intent: Option<IntentStrategyConfig>,
    #[serde(default)]
    pub priority: Option<PriorityStrategyConfig>,
    #[serde(default)]
    pub penalty: Option<PenaltyStrategyConfig>,
    #[serde(default)]
    pub random: Option<RandomStrategyConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IntentStrategyConfig {
    #[serde(default)]
    pub routes: HashMap<String, String>,
    pub default_candidate: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PriorityStrategyConfig {
    pub bands: Vec<PriorityBand>,
    #[serde(default)]
    pub fallback: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PenaltyStrategyConfig {
    #[serde(default = "default_max_acceptable_penalty")]
    pub max_acceptable_penalty: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RandomStrategyConfig {
    pub pool: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CooperativeConfig {
    #[serde(default = "default_coop_unit")]
    pub coop_unit: f64,
    #[serde(default = "default_max_cooperative")]
    pub max_cooperative: usize,
    #[serde(default)]
    pub intent_costs: HashMap<String, f64>,
    #[serde(default = "default_intent_cost")]
    pub default_cost: f64,
}

impl Default for CooperativeConfig {
    fn default() -> Self {
        Self {
            coop_unit: default_coop_unit(),
            max_cooperative: default_max_cooperative(),
            intent_costs: HashMap::new(),
            default_cost: default_intent_cost(),
        }
    }
}

/// Reads an [`EngineConfig`] from a JSON5 file.
pub fn load_config(path: impl AsRef<Path>) -> Result<EngineConfig> {
    let path = path.as_ref();
    let raw = fs::read_to_string(path)
        .with_context(|| format!("failed to read engine config {}", path.display()))?;
    let config: EngineConfig = json5::from_str(&raw)
        .with_context(|| format!("failed to parse engine config {}", path.display()))?;
    Ok(config)
}

impl EngineConfig {
    /// Assembles an engine, failing fast on any policy-clarity violation:
    /// missing default envelope, references to undeclared candidates, or
    /// an empty strategy chain.
    pub fn build(
        &self,
        registry: Arc<CandidateRegistry>,
        pressure_source: Arc<dyn PressureSource>,
    ) -> Result<AdmissionEngine, ConfigError> {
        self.build_with(
            registry,
            pressure_source,
            Vec::new(),
            Arc::new(ThreadRngSource),
            None,
        )
    }

    pub fn build_with(
        &self,
        registry: Arc<CandidateRegistry>,
        pressure_source: Arc<dyn PressureSource>,
        sinks: Vec<Arc<dyn DecisionEventSink>>,
        random_source: Arc<dyn RandomSource>,
        penalty_tracker: Option<Arc<PenaltyTracker>>,
    ) -> Result<AdmissionEngine, ConfigError> {
        if self.store_capacity == 0 {
            return Err(invalid_value("store_capacity must be at least 1"));
        }

        let envelopes = self.build_envelopes(&registry)?;
        let default_id = self
            .default_envelope
            .as_deref()
            .ok_or_else(missing_default_envelope)?;
        let default_envelope = envelopes
            .values()
            .find(|envelope| envelope.id == default_id)
            .cloned()
            .or_else(|| {
                self.envelopes
                    .iter()
                    .find(|declared| declared.id == default_id)
                    .map(|declared| Arc::new(Self::materialize_envelope(declared)))
            })
            .ok_or_else(|| unknown_envelope(default_id))?;

        let chain = self.build_chain(&registry, random_source, penalty_tracker)?;
        let cooperative = CooperativePolicy::new(
            self.cooperative.coop_unit,
            self.cooperative.max_cooperative,
            self.cooperative.intent_costs.clone(),
            self.cooperative.default_cost,
        );

        Ok(AdmissionEngine::new(
            EnvelopeResolver::new(envelopes),
            default_envelope,
            EphemeralStateStore::<TaskRuntimeState>::new(
                self.store_capacity,
                Duration::from_millis(self.store_ttl_ms),
            ),
            PressureObserver::new(pressure_source),
            CircuitDistributor::new(chain, cooperative, registry.clone()),
            registry,
            sinks,
        ))
    }

    fn build_envelopes(
        &self,
        registry: &CandidateRegistry,
    ) -> Result<HashMap<String, Arc<DecisionEnvelope>>, ConfigError> {
        let mut by_intent = HashMap::new();
        let mut seen_ids = HashMap::new();
        for declared in &self.envelopes {
            if seen_ids.insert(declared.id.clone(), ()).is_some() {
                return Err(invalid_value(format!(
                    "duplicate envelope id '{}'",
                    declared.id
                )));
            }
            let mut seen_candidates = HashSet::new();
            for candidate in &declared.eligible_candidates {
                if registry.get(candidate).is_none() {
                    return Err(unknown_candidate(candidate));
                }
                // eligible_candidates is an ordered set; no repeats.
                if !seen_candidates.insert(candidate) {
                    return Err(invalid_value(format!(
                        "candidate '{}' is listed more than once in envelope '{}'",
                        candidate, declared.id
                    )));
                }
            }
            let envelope = Arc::new(Self::materialize_envelope(declared));
            for intent in &declared.intents {
                if by_intent.insert(intent.clone(), envelope.clone()).is_some() {
                    return Err(invalid_value(format!(
                        "intent '{intent}' is mapped to more than one envelope"
                    )));
                }
            }
        }
        Ok(by_intent)
    }

    fn materialize_envelope(declared: &EnvelopeConfig) -> DecisionEnvelope {
        DecisionEnvelope {
            id: declared.id.clone(),
            allow_drop: declared.allow_drop,
            allow_retry: declared.allow_retry,
            allow_cooperate: declared.allow_cooperate,
            allow_history_influence: declared.allow_history_influence,
            eligible_candidates: declared.eligible_candidates.clone(),
        }
    }

    fn build_chain(
        &self,
        registry: &CandidateRegistry,
        random_source: Arc<dyn RandomSource>,
        penalty_tracker: Option<Arc<PenaltyTracker>>,
    ) -> Result<StrategyChain, ConfigError> {
        let mut strategies: Vec<Box<dyn SpawnStrategy>> = Vec::new();

        // Fixed composition order: intent, priority, penalty, random.
        if let Some(intent) = &self.strategies.intent {
            if registry.get(&intent.default_candidate).is_none() {
                return Err(unknown_candidate(&intent.default_candidate));
            }
            for candidate in intent.routes.values() {
                if registry.get(candidate).is_none() {
                    return Err(unknown_candidate(candidate));
                }
            }
            strategies.push(Box::new(IntentStrategy::new(
                intent.routes.clone(),
                intent.default_candidate.clone(),
            )));
        }

        if let Some(priority) = &self.strategies.priority {
            for band in &priority.bands {
                if registry.get(&band.candidate).is_none() {
                    return Err(unknown_candidate(&band.candidate));
                }
            }
            if let Some(fallback) = &priority.fallback {
                if registry.get(fallback).is_none() {
                    return Err(unknown_candidate(fallback));
                }
            }
            strategies.push(Box::new(PriorityStrategy::new(
                priority.bands.clone(),
                priority.fallback.clone(),
            )));
        }

        if let Some(penalty) = &self.strategies.penalty {
            let tracker = match penalty_tracker {
                Some(tracker) => tracker,
                None => Arc::new(PenaltyTracker::new(ForgettingCurve::new(
                    self.penalty_half_life_ms,
                )?)),
            };
            strategies.push(Box::new(PenaltyStrategy::new(
                tracker,
                penalty.max_acceptable_penalty,
            )));
        }

        if let Some(random) = &self.strategies.random {
            if random.pool.is_empty() {
                return Err(invalid_value("random strategy pool must not be empty"));
            }
            for candidate in &random.pool {
                if registry.get(candidate).is_none() {
                    return Err(unknown_candidate(candidate));
                }
            }
            strategies.push(Box::new(RandomStrategy::new(
                random.pool.clone(),
                random_source,
            )));
        }

        if strategies.is_empty() {
            return Err(empty_strategy_chain());
        }
        StrategyChain::new(strategies)
    }
}
