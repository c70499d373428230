use std::sync::Arc;

use turnstile::{
    config::StrategyChainConfig,
    error::ConfigErrorKind,
    pressure::ZeroPressureSource,
    types::{Decision, DropReason},
};

use crate::support::{
    build, config_with, intent_only, permissive_envelope, task, task_with_intent, workers,
};

#[test]
fn given_empty_eligible_set_then_no_destination_is_ever_selected() {
    let workers = workers();
    let config = config_with(
        vec![permissive_envelope("sealed", &[], &[])],
        "sealed",
        intent_only("alpha"),
    );
    let (engine, _) = build(&config, &workers, 0.0);

    let decision = engine.admit(&task("t-sealed", 5, 5));

    // Non-selection surfaces as the catch-all drop reason.
    assert_eq!(
        decision,
        Decision::Drop {
            reason: DropReason::SpawnBudgetExhausted,
            current_depth: 0,
        }
    );
    assert_eq!(workers.alpha.dispatched(), 0);
    assert_eq!(workers.beta.dispatched(), 0);
    assert_eq!(workers.gamma.dispatched(), 0);
}

#[test]
fn given_narrowing_envelope_then_event_reports_narrowed_true() {
    let workers = workers();
    let config = config_with(
        vec![
            permissive_envelope("narrow", &["special"], &["beta"]),
            permissive_envelope("default", &[], &["alpha", "beta", "gamma"]),
        ],
        "default",
        intent_only("alpha"),
    );
    let (engine, sink) = build(&config, &workers, 0.0);

    engine.admit(&task_with_intent("t-narrow", "special", 5, 5));
    engine.admit(&task("t-wide", 5, 5));

    let events = sink.events();
    assert_eq!(events.len(), 2);

    assert_eq!(events[0].envelope_id, "narrow");
    assert!(events[0].envelope_narrowed);
    assert_eq!(events[0].eligible_candidates_count, 1);

    assert_eq!(events[1].envelope_id, "default");
    assert!(!events[1].envelope_narrowed);
    assert_eq!(events[1].eligible_candidates_count, 3);
}

#[test]
fn given_unknown_intent_then_default_envelope_answers() {
    let workers = workers();
    let config = config_with(
        vec![
            permissive_envelope("narrow", &["special"], &["beta"]),
            permissive_envelope("default", &[], &["alpha", "beta", "gamma"]),
        ],
        "default",
        intent_only("alpha"),
    );
    let (engine, sink) = build(&config, &workers, 0.0);

    engine.admit(&task_with_intent("t-unknown", "never-declared", 5, 5));

    assert_eq!(sink.events()[0].envelope_id, "default");
}

#[test]
fn given_no_default_envelope_then_build_fails_fast() {
    let workers = workers();
    let mut config = config_with(
        vec![permissive_envelope("default", &[], &["alpha"])],
        "default",
        intent_only("alpha"),
    );
    config.default_envelope = None;

    let err = config
        .build(workers.registry.clone(), Arc::new(ZeroPressureSource))
        .expect_err("missing default envelope must be rejected");
    assert_eq!(err.kind, ConfigErrorKind::MissingDefaultEnvelope);
}

#[test]
fn given_default_envelope_id_not_declared_then_build_fails_fast() {
    let workers = workers();
    let config = config_with(
        vec![permissive_envelope("declared", &[], &["alpha"])],
        "phantom",
        intent_only("alpha"),
    );

    let err = config
        .build(workers.registry.clone(), Arc::new(ZeroPressureSource))
        .expect_err("unknown default envelope must be rejected");
    assert_eq!(err.kind, ConfigErrorKind::UnknownEnvelope);
}

#[test]
fn given_no_strategies_at_all_then_build_fails_fast() {
    let workers = workers();
    let config = config_with(
        vec![permissive_envelope("default", &[], &["alpha"])],
        "default",
        StrategyChainConfig::default(),
    );

    let err = config
        .build(workers.registry.clone(), Arc::new(ZeroPressureSource))
        .expect_err("empty strategy chain must be rejected");
    assert_eq!(err.kind, ConfigErrorKind::EmptyStrategyChain);
}

#[test]
fn given_envelope_repeating_a_candidate_then_build_fails_fast() {
    let workers = workers();
    let config = config_with(
        vec![permissive_envelope("default", &[], &["alpha", "alpha", "beta"])],
        "default",
        intent_only("alpha"),
    );

    // A repeated id would make two distinct destinations look like three
    // and report envelope_narrowed = false against a 3-candidate registry.
    let err = config
        .build(workers.registry.clone(), Arc::new(ZeroPressureSource))
        .expect_err("repeated candidate id must be rejected");
    assert_eq!(err.kind, ConfigErrorKind::InvalidValue);
}

#[test]
fn given_envelope_naming_unknown_candidate_then_build_fails_fast() {
    let workers = workers();
    let config = config_with(
        vec![permissive_envelope("default", &[], &["alpha", "delta"])],
        "default",
        intent_only("alpha"),
    );

    let err = config
        .build(workers.registry.clone(), Arc::new(ZeroPressureSource))
        .expect_err("undeclared candidate must be rejected");
    assert_eq!(err.kind, ConfigErrorKind::UnknownCandidate);
}
