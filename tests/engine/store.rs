use std::{thread::sleep, time::Duration};

use turnstile::store::EphemeralStateStore;

#[test]
fn given_store_at_capacity_then_new_key_evicts_nearest_expiry_first() {
    let store = EphemeralStateStore::<u32>::new(3, Duration::from_secs(60));
    store.set_with_ttl("a", 1, Duration::from_millis(400));
    store.set_with_ttl("b", 2, Duration::from_millis(100));
    store.set_with_ttl("c", 3, Duration::from_millis(800));

    store.set("d", 4);

    assert_eq!(store.len(), 3);
    assert!(!store.has("b"), "the entry with the nearest expiry goes first");
    assert!(store.has("a"));
    assert!(store.has("c"));
    assert!(store.has("d"));
}

#[test]
fn given_store_at_capacity_then_overwriting_existing_key_evicts_nothing() {
    let store = EphemeralStateStore::<u32>::new(3, Duration::from_secs(60));
    store.set("a", 1);
    store.set("b", 2);
    store.set("c", 3);

    store.set("b", 20);

    assert_eq!(store.len(), 3);
    assert_eq!(store.get("b"), Some(20));
    assert!(store.has("a") && store.has("c"));
}

#[test]
fn given_expired_entry_then_get_treats_it_as_absent() {
    let store = EphemeralStateStore::<u32>::new(8, Duration::from_millis(20));
    store.set("short", 1);
    store.set_with_ttl("long", 2, Duration::from_secs(60));

    sleep(Duration::from_millis(60));

    assert_eq!(store.get("short"), None);
    assert_eq!(store.get("long"), Some(2));
}

#[test]
fn given_expired_entries_then_prune_removes_and_counts_them() {
    let store = EphemeralStateStore::<u32>::new(8, Duration::from_millis(20));
    store.set("one", 1);
    store.set("two", 2);
    store.set_with_ttl("keep", 3, Duration::from_secs(60));

    sleep(Duration::from_millis(60));

    assert_eq!(store.prune(), 2);
    assert_eq!(store.len(), 1);
    assert_eq!(store.prune(), 0);
}

#[test]
fn given_delete_and_clear_then_entries_are_gone() {
    let store = EphemeralStateStore::<u32>::new(8, Duration::from_secs(60));
    store.set("a", 1);
    store.set("b", 2);

    assert!(store.delete("a"));
    assert!(!store.delete("a"));
    store.clear();
    assert!(store.is_empty());
}

#[test]
fn given_absent_key_then_mutate_starts_from_default_state() {
    let store = EphemeralStateStore::<u32>::new(8, Duration::from_secs(60));

    let seen = store.mutate("fresh", |value| {
        let before = *value;
        *value += 5;
        before
    });

    assert_eq!(seen, 0);
    assert_eq!(store.get("fresh"), Some(5));
}

#[test]
fn given_absent_key_then_mutate_existing_is_a_noop() {
    let store = EphemeralStateStore::<u32>::new(8, Duration::from_secs(60));

    assert!(!store.mutate_existing("ghost", |value| *value += 1));
    assert!(store.get("ghost").is_none());
}
