use turnstile::types::{Decision, DropReason};

use crate::support::{build, config_with, intent_only, permissive_envelope, task, workers};

fn config(allow_drop: bool) -> turnstile::config::EngineConfig {
    let mut envelope = permissive_envelope("default", &[], &["alpha", "beta", "gamma"]);
    envelope.allow_drop = allow_drop;
    config_with(vec![envelope], "default", intent_only("alpha"))
}

#[test]
fn given_high_pressure_and_drop_allowed_then_admission_drops_for_pressure() {
    let workers = workers();
    let (engine, _) = build(&config(true), &workers, 0.95);

    let decision = engine.admit(&task("t-hot", 5, 5));

    assert_eq!(
        decision,
        Decision::Drop {
            reason: DropReason::PressureExceeded,
            current_depth: 0,
        }
    );
    assert_eq!(workers.alpha.dispatched(), 0);
}

#[test]
fn given_high_pressure_and_drop_forbidden_then_admission_still_dispatches() {
    let workers = workers();
    let (engine, _) = build(&config(false), &workers, 1.0);

    // Mask semantics: with allow_drop off the pressure gate is skipped
    // entirely, not merely softened.
    assert_eq!(engine.admit(&task("t-masked", 5, 5)), Decision::Dispatch);
    assert_eq!(workers.alpha.dispatched(), 1);
}

#[test]
fn given_pressure_exactly_at_threshold_then_admission_dispatches() {
    let workers = workers();
    let (engine, _) = build(&config(true), &workers, 0.9);

    // The gate is strictly greater-than.
    assert_eq!(engine.admit(&task("t-edge", 5, 5)), Decision::Dispatch);
}

#[test]
fn given_budget_exhausted_then_budget_drop_wins_over_pressure_drop() {
    let workers = workers();
    let (engine, _) = build(&config(true), &workers, 1.0);
    let task = task("t-order", 0, 5);

    assert_eq!(
        engine.admit(&task).drop_reason(),
        Some(DropReason::SpawnBudgetExhausted)
    );
}
