use crate::{
    error::{ConfigError, empty_strategy_chain},
    pressure::PressureSignal,
    types::{CandidateId, Task, TaskRuntimeState},
};

/// Read-only view handed to strategies. It deliberately carries the
/// pre-filtered eligible-candidate list instead of the envelope, so a
/// strategy cannot branch on policy flags by construction.
pub struct SelectionContext<'a> {
    pub task: &'a Task,
    pub runtime_state: &'a TaskRuntimeState,
    pub pressure: &'a PressureSignal,
    pub eligible: &'a [CandidateId],
}

impl SelectionContext<'_> {
    pub fn is_eligible(&self, id: &str) -> bool {
        self.eligible.iter().any(|candidate| candidate == id)
    }

    pub fn budgets_exhausted(&self) -> bool {
        self.runtime_state.spawn_count >= self.task.metadata.spawn_budget
            || self.runtime_state.retry_depth >= self.task.metadata.max_retry_depth
    }

    pub fn declared_priority(&self) -> u8 {
        self.task.metadata.priority.unwrap_or(0)
    }
}

/// One link in the selection chain. Returns `Some` with an eligible
/// candidate id, or `None` to pass the task to the next strategy.
pub trait SpawnStrategy: Send + Sync {
    fn name(&self) -> &'static str;

    /// Whether this strategy reads accumulated history (penalties, bias).
    /// The distributor masks history-driven strategies out when the
    /// envelope forbids history influence.
    fn uses_history(&self) -> bool {
        false
    }

    fn select(&self, ctx: &SelectionContext<'_>) -> Option<CandidateId>;
}

/// Ordered strategy composition: strategies are tried in the fixed order
/// they were supplied in, and the first non-`None` result wins.
pub struct StrategyChain {
    strategies: Vec<Box<dyn SpawnStrategy>>,
}

impl StrategyChain {
    pub fn new(strategies: Vec<Box<dyn SpawnStrategy>>) -> Result<Self, ConfigError> {
        if strategies.is_empty() {
            return Err(empty_strategy_chain());
        }
        Ok(Self { strategies })
    }

    pub fn len(&self) -> usize {
        self.strategies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.strategies.is_empty()
    }

    pub fn select(&self, ctx: &SelectionContext<'_>, allow_history: bool) -> Option<CandidateId> {
        for strategy in &self.strategies {
            if strategy.uses_history() && !allow_history {
                continue;
            }
            if let Some(candidate) = strategy.select(ctx) {
                tracing::trace!(
                    strategy = strategy.name(),
                    candidate = %candidate,
                    task_id = %ctx.task.id,
                    "strategy selected candidate"
                );
                return Some(candidate);
            }
        }
        None
    }
}
