use std::{
    collections::HashMap,
    sync::{Arc, Mutex, MutexGuard},
    time::{Duration, Instant},
};

use crate::{
    decay::ForgettingCurve,
    distributor::strategy::{SelectionContext, SpawnStrategy},
    types::CandidateId,
};

/// Records older than this are dropped outright, decay notwithstanding.
const PENALTY_RETENTION: Duration = Duration::from_secs(30 * 60);

#[derive(Debug, Clone, Copy)]
struct PenaltyRecord {
    penalty: f64,
    recorded_at: Instant,
}

/// Per-destination negative bias, aged by the forgetting curve. Only
/// penalties are representable; there is no positive-reinforcement path.
pub struct PenaltyTracker {
    records: Mutex<HashMap<CandidateId, Vec<PenaltyRecord>>>,
    curve: ForgettingCurve,
}

impl PenaltyTracker {
    pub fn new(curve: ForgettingCurve) -> Self {
        Self {
            records: Mutex::new(HashMap::new()),
            curve,
        }
    }

    /// Charges `penalty` against a destination. Non-positive and non-finite
    /// values are ignored.
    pub fn record(&self, candidate: impl Into<CandidateId>, penalty: f64) {
        if !penalty.is_finite() || penalty <= 0.0 {
            return;
        }
        self.lock().entry(candidate.into()).or_default().push(PenaltyRecord {
            penalty,
            recorded_at: Instant::now(),
        });
    }

    #[cfg(test)]
    fn record_at(&self, candidate: impl Into<CandidateId>, penalty: f64, recorded_at: Instant) {
        self.lock().entry(candidate.into()).or_default().push(PenaltyRecord {
            penalty,
            recorded_at,
        });
    }

    /// Decay-weighted sum of the destination's live penalty records.
    /// Expired records are pruned as a side effect.
    pub fn effective_penalty(&self, candidate: &str) -> f64 {
        let now = Instant::now();
        let mut guard = self.lock();
        let Some(records) = guard.get_mut(candidate) else {
            return 0.0;
        };
        records.retain(|record| now.duration_since(record.recorded_at) <= PENALTY_RETENTION);
        let total = records
            .iter()
            .map(|record| {
                let elapsed_ms = now.duration_since(record.recorded_at).as_secs_f64() * 1_000.0;
                record.penalty * self.curve.decay_weight(elapsed_ms)
            })
            .sum();
        if records.is_empty() {
            guard.remove(candidate);
        }
        total
    }

    pub fn clear(&self) {
        self.lock().clear();
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<CandidateId, Vec<PenaltyRecord>>> {
        self.records.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// Picks the eligible destination with the lowest effective penalty.
/// Passes when even the best destination is past the acceptability
/// threshold, leaving the decision to the next strategy.
pub struct PenaltyStrategy {
    tracker: Arc<PenaltyTracker>,
    max_acceptable_penalty: f64,
}

impl PenaltyStrategy {
    pub fn new(tracker: Arc<PenaltyTracker>, max_acceptable_penalty: f64) -> Self {
        Self {
            tracker,
            max_acceptable_penalty,
        }
    }
}

impl SpawnStrategy for PenaltyStrategy {
    fn name(&self) -> &'static str {
        "penalty"
    }

    fn uses_history(&self) -> bool {
        true
    }

    fn select(&self, ctx: &SelectionContext<'_>) -> Option<CandidateId> {
        if ctx.budgets_exhausted() {
            return None;
        }

        let mut best: Option<(&CandidateId, f64)> = None;
        for candidate in ctx.eligible {
            let penalty = self.tracker.effective_penalty(candidate);
            // Ties keep the earlier candidate in envelope order.
            if best.is_none_or(|(_, current)| penalty < current) {
                best = Some((candidate, penalty));
            }
        }

        let (candidate, penalty) = best?;
        if penalty > self.max_acceptable_penalty {
            return None;
        }
        Some(candidate.clone())
    }
}
