use std::collections::HashMap;

use crate::{
    distributor::strategy::{SelectionContext, SpawnStrategy},
    types::{CandidateId, IntentKey},
};

/// Static intent-to-destination routing table with a default destination.
/// First link in the chain: for a task within budget it always has an
/// answer unless neither the mapped nor the default destination is
/// eligible under the envelope.
pub struct IntentStrategy {
    routes: HashMap<IntentKey, CandidateId>,
    default_candidate: CandidateId,
}

impl IntentStrategy {
    pub fn new(routes: HashMap<IntentKey, CandidateId>, default_candidate: CandidateId) -> Self {
        Self {
            routes,
            default_candidate,
        }
    }
}

impl SpawnStrategy for IntentStrategy {
    fn name(&self) -> &'static str {
        "intent"
    }

    fn select(&self, ctx: &SelectionContext<'_>) -> Option<CandidateId> {
        if ctx.budgets_exhausted() {
            return None;
        }

        let mapped = ctx
            .task
            .metadata
            .intent
            .as_deref()
            .and_then(|intent| self.routes.get(intent));

        if let Some(candidate) = mapped {
            if ctx.is_eligible(candidate) {
                return Some(candidate.clone());
            }
        }

        if ctx.is_eligible(&self.default_candidate) {
            return Some(self.default_candidate.clone());
        }

        None
    }
}
