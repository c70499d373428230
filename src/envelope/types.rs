use serde::{Deserialize, Serialize};

use crate::types::{CandidateId, EnvelopeId};

/// Static per-class admission policy. Built at configuration time, shared
/// behind `Arc`, never recomputed from pressure, history, or outcomes.
///
/// An empty `eligible_candidates` list means no destination is admissible
/// for this class: it is a hard exclusion, never "all eligible".
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecisionEnvelope {
    pub id: EnvelopeId,
    pub allow_drop: bool,
    pub allow_retry: bool,
    pub allow_cooperate: bool,
    pub allow_history_influence: bool,
    pub eligible_candidates: Vec<CandidateId>,
}

impl DecisionEnvelope {
    /// Permissive envelope over the given candidates: every decision type
    /// admissible, history allowed.
    pub fn permissive(id: impl Into<EnvelopeId>, eligible_candidates: Vec<CandidateId>) -> Self {
        Self {
            id: id.into(),
            allow_drop: true,
            allow_retry: true,
            allow_cooperate: true,
            allow_history_influence: true,
            eligible_candidates,
        }
    }

    /// Whether this envelope narrows the candidate set relative to the full
    /// registry. Reported on every decision event.
    pub fn narrows(&self, registry_count: usize) -> bool {
        self.eligible_candidates.len() < registry_count
    }
}
