use std::sync::Arc;

use rand::Rng;

use crate::{
    distributor::strategy::{SelectionContext, SpawnStrategy},
    types::CandidateId,
};

/// Injectable randomness. `pick(bound)` returns an index in `[0, bound)`;
/// `bound` is always at least 1.
pub trait RandomSource: Send + Sync {
    fn pick(&self, bound: usize) -> usize;
}

/// Default source backed by the thread-local generator.
pub struct ThreadRngSource;

impl RandomSource for ThreadRngSource {
    fn pick(&self, bound: usize) -> usize {
        rand::thread_rng().gen_range(0..bound)
    }
}

/// Last resort in the chain: uniform choice over a configured pool,
/// restricted to candidates the envelope left eligible.
pub struct RandomStrategy {
    pool: Vec<CandidateId>,
    source: Arc<dyn RandomSource>,
}

impl RandomStrategy {
    pub fn new(pool: Vec<CandidateId>, source: Arc<dyn RandomSource>) -> Self {
        Self { pool, source }
    }
}

impl SpawnStrategy for RandomStrategy {
    fn name(&self) -> &'static str {
        "random"
    }

    fn select(&self, ctx: &SelectionContext<'_>) -> Option<CandidateId> {
        if ctx.budgets_exhausted() {
            return None;
        }

        let options: Vec<&CandidateId> = self
            .pool
            .iter()
            .filter(|candidate| ctx.is_eligible(candidate))
            .collect();
        if options.is_empty() {
            return None;
        }
        let index = self.source.pick(options.len()).min(options.len() - 1);
        Some(options[index].clone())
    }
}
