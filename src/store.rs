use std::{
    collections::HashMap,
    sync::{Mutex, MutexGuard},
    time::{Duration, Instant},
};

#[derive(Debug, Clone)]
struct StoreEntry<V> {
    value: V,
    ttl: Duration,
    expires_at: Instant,
}

impl<V> StoreEntry<V> {
    fn expired(&self, now: Instant) -> bool {
        self.expires_at <= now
    }
}

/// Capacity- and time-bounded key/value arena for per-task runtime counters.
///
/// Nothing stored here is required for correctness: an evicted or expired
/// entry is indistinguishable from a task that was never seen. A single
/// store-wide mutex serializes read-modify-write sequences so concurrent
/// admissions cannot lose counter updates.
pub struct EphemeralStateStore<V> {
    inner: Mutex<HashMap<String, StoreEntry<V>>>,
    capacity: usize,
    default_ttl: Duration,
}

impl<V> EphemeralStateStore<V> {
    pub fn new(capacity: usize, default_ttl: Duration) -> Self {
        Self {
            inner: Mutex::new(HashMap::new()),
            capacity: capacity.max(1),
            default_ttl,
        }
    }

    pub fn default_ttl(&self) -> Duration {
        self.default_ttl
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn set(&self, key: impl Into<String>, value: V) {
        self.set_with_ttl(key, value, self.default_ttl);
    }

    pub fn set_with_ttl(&self, key: impl Into<String>, value: V, ttl: Duration) {
        let now = Instant::now();
        let mut guard = self.lock();
        Self::insert_entry(&mut guard, self.capacity, key.into(), value, ttl, now);
    }

    pub fn get(&self, key: &str) -> Option<V>
    where
        V: Clone,
    {
        let now = Instant::now();
        let mut guard = self.lock();
        match guard.get(key) {
            Some(entry) if entry.expired(now) => {
                guard.remove(key);
                None
            }
            Some(entry) => Some(entry.value.clone()),
            None => None,
        }
    }

    pub fn has(&self, key: &str) -> bool {
        let now = Instant::now();
        let mut guard = self.lock();
        match guard.get(key) {
            Some(entry) if entry.expired(now) => {
                guard.remove(key);
                false
            }
            Some(_) => true,
            None => false,
        }
    }

    pub fn delete(&self, key: &str) -> bool {
        self.lock().remove(key).is_some()
    }

    pub fn clear(&self) {
        self.lock().clear();
    }

    /// Eagerly removes every expired entry, returning how many were dropped.
    /// Periodic maintenance only; lazy removal on access already keeps the
    /// store correct without it.
    pub fn prune(&self) -> usize {
        let now = Instant::now();
        let mut guard = self.lock();
        let before = guard.len();
        guard.retain(|_, entry| !entry.expired(now));
        before - guard.len()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Applies `f` to the live entry under `key`, creating a default-valued
    /// entry first when none exists. The whole sequence runs under the store
    /// lock, and the entry's expiry is refreshed from its own TTL on every
    /// mutation.
    pub fn mutate<R>(&self, key: &str, f: impl FnOnce(&mut V) -> R) -> R
    where
        V: Default,
    {
        let now = Instant::now();
        let mut guard = self.lock();
        let live = matches!(guard.get(key), Some(entry) if !entry.expired(now));
        if !live {
            Self::insert_entry(
                &mut guard,
                self.capacity,
                key.to_string(),
                V::default(),
                self.default_ttl,
                now,
            );
        }
        let entry = guard.get_mut(key).expect("entry inserted above");
        entry.expires_at = now + entry.ttl;
        f(&mut entry.value)
    }

    /// Applies `f` only when a live entry exists; returns whether it did.
    pub fn mutate_existing(&self, key: &str, f: impl FnOnce(&mut V)) -> bool {
        let now = Instant::now();
        let mut guard = self.lock();
        match guard.get_mut(key) {
            Some(entry) if entry.expired(now) => {
                guard.remove(key);
                false
            }
            Some(entry) => {
                entry.expires_at = now + entry.ttl;
                f(&mut entry.value);
                true
            }
            None => false,
        }
    }

    fn insert_entry(
        guard: &mut MutexGuard<'_, HashMap<String, StoreEntry<V>>>,
        capacity: usize,
        key: String,
        value: V,
        ttl: Duration,
        now: Instant,
    ) {
        // A set on an existing key never triggers eviction.
        if !guard.contains_key(&key) && guard.len() >= capacity {
            let nearest = guard
                .iter()
                .min_by_key(|(_, entry)| entry.expires_at)
                .map(|(k, _)| k.clone());
            if let Some(victim) = nearest {
                guard.remove(&victim);
            }
        }
        guard.insert(
            key,
            StoreEntry {
                value,
                ttl,
                expires_at: now + ttl,
            },
        );
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, StoreEntry<V>>> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
