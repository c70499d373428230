use turnstile::{
    event::{DECISION_EVENT_SCHEMA_VERSION, DecisionEvent},
    types::Decision,
};

use crate::support::{build, default_config, task, workers};

#[test]
fn given_any_admission_then_exactly_one_event_is_emitted() {
    let workers = workers();
    let (engine, sink) = build(&default_config(), &workers, 0.0);

    engine.admit(&task("t-one", 5, 5));
    engine.admit(&task("t-two", 0, 5));
    engine.admit(&task("t-three", 5, 0));

    let events = sink.events();
    assert_eq!(events.len(), 3, "dispatches and drops alike must be observable");
    assert!(events.iter().all(|event| event.schema_version == DECISION_EVENT_SCHEMA_VERSION));
    assert_eq!(events[0].task_id, "t-one");
    assert!(events[0].decision.is_dispatch());
    assert!(!events[1].decision.is_dispatch());
}

#[test]
fn given_drop_event_then_json_carries_snake_case_reason_and_pressure() {
    let workers = workers();
    let (engine, sink) = build(&default_config(), &workers, 0.4);

    engine.admit(&task("t-json", 0, 5));

    let event = &sink.events()[0];
    let json = serde_json::to_value(event).expect("event should serialize");

    assert_eq!(json["schema_version"], "1.0");
    assert_eq!(json["task_id"], "t-json");
    assert_eq!(json["decision"]["type"], "drop");
    assert_eq!(json["decision"]["reason"], "spawn_budget_exhausted");
    assert_eq!(json["decision"]["current_depth"], 0);
    assert_eq!(json["envelope_id"], "default");
    assert_eq!(json["pressure"]["memory"], 0.4);
    assert_eq!(json["pressure"]["queue_depth"], 0.4);
    assert_eq!(json["pressure"]["spawn_saturation"], 0.4);
    assert!(json["timestamp_ms"].as_u64().unwrap_or(0) > 0);
}

#[test]
fn given_serialized_event_then_it_round_trips_and_tolerates_unknown_fields() {
    let workers = workers();
    let (engine, sink) = build(&default_config(), &workers, 0.0);
    engine.admit(&task("t-round", 5, 5));

    let event = &sink.events()[0];
    let mut json = serde_json::to_value(event).expect("event should serialize");
    json["future_field"] = serde_json::json!("ignored");

    let back: DecisionEvent =
        serde_json::from_value(json).expect("unknown fields must not break consumers");
    assert_eq!(back.decision, Decision::Dispatch);
    assert_eq!(back.task_id, "t-round");
}

#[test]
fn given_dispatch_then_event_decision_tag_is_dispatch() {
    let workers = workers();
    let (engine, sink) = build(&default_config(), &workers, 0.0);

    engine.admit(&task("t-tag", 5, 5));

    let json = serde_json::to_value(&sink.events()[0]).expect("event should serialize");
    assert_eq!(json["decision"]["type"], "dispatch");
}
