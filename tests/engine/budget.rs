use turnstile::types::{Decision, DropReason};

use crate::support::{build, default_config, task, workers};

#[test]
fn given_spawn_budget_three_when_admitted_five_times_then_only_three_dispatch() {
    let workers = workers();
    let (engine, _) = build(&default_config(), &workers, 0.0);
    let task = task("t-budget", 3, 10);

    let decisions: Vec<Decision> = (0..5).map(|_| engine.admit(&task)).collect();

    assert_eq!(decisions[0], Decision::Dispatch);
    assert_eq!(decisions[1], Decision::Dispatch);
    assert_eq!(decisions[2], Decision::Dispatch);
    for late in &decisions[3..] {
        assert_eq!(
            late.drop_reason(),
            Some(DropReason::SpawnBudgetExhausted),
            "admissions past the budget must drop"
        );
    }

    assert_eq!(workers.alpha.dispatched(), 3);
    let state = engine.runtime_state("t-budget").expect("state should exist");
    assert_eq!(state.spawn_count, 3);
}

#[test]
fn given_retry_depth_at_cap_when_admitted_then_drops_even_with_budget_left() {
    let workers = workers();
    let (engine, _) = build(&default_config(), &workers, 0.0);
    let task = task("t-retry", 10, 2);

    assert_eq!(engine.admit(&task), Decision::Dispatch);
    engine.signal_retry("t-retry");
    engine.signal_retry("t-retry");

    let decision = engine.admit(&task);
    assert_eq!(
        decision,
        Decision::Drop {
            reason: DropReason::RetryDepthExhausted,
            current_depth: 2,
        }
    );
    assert_eq!(workers.alpha.dispatched(), 1);
}

#[test]
fn given_retry_signals_then_depth_increments_strictly_by_one() {
    let workers = workers();
    let (engine, _) = build(&default_config(), &workers, 0.0);
    let task = task("t-steps", 10, 10);

    engine.admit(&task);
    assert_eq!(engine.runtime_state("t-steps").unwrap().retry_depth, 0);
    engine.signal_retry("t-steps");
    assert_eq!(engine.runtime_state("t-steps").unwrap().retry_depth, 1);
    engine.signal_retry("t-steps");
    assert_eq!(engine.runtime_state("t-steps").unwrap().retry_depth, 2);
}

#[test]
fn given_unknown_task_when_signal_retry_then_nothing_happens() {
    let workers = workers();
    let (engine, _) = build(&default_config(), &workers, 0.0);

    engine.signal_retry("ghost");

    assert!(engine.runtime_state("ghost").is_none());
}

#[test]
fn given_engine_replaced_then_runtime_state_resets_without_error() {
    let workers = workers();
    let config = default_config();
    let (first, _) = build(&config, &workers, 0.0);
    let task = task("t-restart", 1, 5);

    assert_eq!(first.admit(&task), Decision::Dispatch);
    assert_eq!(
        first.admit(&task).drop_reason(),
        Some(DropReason::SpawnBudgetExhausted)
    );

    // Simulated process restart: a fresh engine has no memory of the task.
    let (second, _) = build(&config, &workers, 0.0);
    assert!(second.runtime_state("t-restart").is_none());
    assert_eq!(second.admit(&task), Decision::Dispatch);
    assert_eq!(second.runtime_state("t-restart").unwrap().spawn_count, 1);
}

#[test]
fn given_zero_spawn_budget_then_first_admission_already_drops() {
    let workers = workers();
    let (engine, _) = build(&default_config(), &workers, 0.0);
    let task = task("t-zero", 0, 5);

    assert_eq!(
        engine.admit(&task).drop_reason(),
        Some(DropReason::SpawnBudgetExhausted)
    );
    assert_eq!(workers.alpha.dispatched(), 0);
}
