use serde::{Deserialize, Serialize};

use crate::{
    distributor::strategy::{SelectionContext, SpawnStrategy},
    types::{CandidateId, MAX_PRIORITY},
};

/// Each retry raises effective priority by this much, capped below.
const RETRY_PRIORITY_STEP: u32 = 5;
const RETRY_PRIORITY_CAP: u32 = 20;

/// One admission band: tasks at or above `min_priority` whose average
/// pressure is at or below `max_pressure` route to `candidate`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriorityBand {
    pub min_priority: u8,
    pub max_pressure: f64,
    pub candidate: CandidateId,
}

/// Threshold-band routing on effective priority. Retry depth boosts the
/// declared priority so long-suffering tasks climb bands, but priority
/// never bypasses budget eligibility.
pub struct PriorityStrategy {
    bands: Vec<PriorityBand>,
    fallback: Option<CandidateId>,
}

impl PriorityStrategy {
    pub fn new(bands: Vec<PriorityBand>, fallback: Option<CandidateId>) -> Self {
        Self { bands, fallback }
    }

    pub fn effective_priority(declared: u8, retry_depth: u32) -> u8 {
        let boost = (retry_depth.saturating_mul(RETRY_PRIORITY_STEP)).min(RETRY_PRIORITY_CAP);
        (u32::from(declared) + boost).min(u32::from(MAX_PRIORITY)) as u8
    }
}

impl SpawnStrategy for PriorityStrategy {
    fn name(&self) -> &'static str {
        "priority"
    }

    fn select(&self, ctx: &SelectionContext<'_>) -> Option<CandidateId> {
        if ctx.budgets_exhausted() {
            return None;
        }

        let effective =
            Self::effective_priority(ctx.declared_priority(), ctx.runtime_state.retry_depth);
        let avg_pressure = ctx.pressure.average();

        for band in &self.bands {
            if effective >= band.min_priority
                && avg_pressure <= band.max_pressure
                && ctx.is_eligible(&band.candidate)
            {
                return Some(band.candidate.clone());
            }
        }

        self.fallback
            .as_ref()
            .filter(|candidate| ctx.is_eligible(candidate))
            .cloned()
    }
}
