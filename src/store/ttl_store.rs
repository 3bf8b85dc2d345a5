//! TTL-indexed key-value store for per-session sets and counters
//!
//! Each key holds either a set of strings or an integer counter. Every
//! mutating write renews the key's single expiry deadline in the
//! [`MinHeapScheduler`]; the reaper later pops due deadlines and evicts the
//! payload. Reads check the entry's own deadline, so a key whose time is up
//! reads as absent even before the reaper has caught up.
//!
//! The store is a cheap cloneable handle. All state sits behind one mutex that
//! is only held for the duration of a single synchronous operation, never
//! across an `.await`.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tokio::time::Instant;
use tracing::debug;

use crate::store::scheduler::MinHeapScheduler;
use crate::store::types::{KeyedPayload, StoreConfig, StoredEntry};

struct StoreInner {
    entries: HashMap<String, StoredEntry>,
    scheduler: MinHeapScheduler,
}

impl StoreInner {
    /// Moves `key`'s deadline to `now + ttl`, or makes it non-expiring when
    /// `ttl` is zero. Returns the new deadline.
    fn renew(&mut self, key: &str, ttl: Duration, now: Instant) -> Option<Instant> {
        self.scheduler.remove(key);
        if ttl.is_zero() {
            return None;
        }
        let deadline = now + ttl;
        self.scheduler.push(key, deadline);
        Some(deadline)
    }

    fn live_entry(&self, key: &str, now: Instant) -> Option<&StoredEntry> {
        self.entries.get(key).filter(|entry| entry.is_live(now))
    }

    fn evict(&mut self, key: &str) -> bool {
        let had_schedule = self.scheduler.remove(key);
        let had_entry = self.entries.remove(key).is_some();
        had_schedule || had_entry
    }
}

#[derive(Clone)]
pub struct TtlKeySetStore {
    inner: Arc<Mutex<StoreInner>>,
    config: StoreConfig,
}

impl TtlKeySetStore {
    /// Creates a store with default TTL and cleanup interval
    pub fn new() -> Self {
        Self::with_config(StoreConfig::default())
    }

    pub fn with_config(config: StoreConfig) -> Self {
        Self {
            inner: Arc::new(Mutex::new(StoreInner {
                entries: HashMap::new(),
                scheduler: MinHeapScheduler::new(),
            })),
            config,
        }
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    fn lock(&self) -> MutexGuard<'_, StoreInner> {
        // Every critical section leaves the maps consistent before it can
        // panic, so a poisoned lock still guards valid state.
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Adds `value` to the set at `key` using the default TTL
    pub fn add_to_set(&self, key: &str, value: impl Into<String>) {
        self.add_to_set_with_ttl(key, value, self.config.default_ttl);
    }

    /// Adds `value` to the set at `key` and renews the whole key to `now + ttl`.
    ///
    /// A zero `ttl` leaves the key without any scheduled expiry. If the key
    /// currently holds a counter, the counter is replaced by a fresh set.
    pub fn add_to_set_with_ttl(&self, key: &str, value: impl Into<String>, ttl: Duration) {
        let value = value.into();
        let now = Instant::now();
        let mut inner = self.lock();

        let expires_at = inner.renew(key, ttl, now);
        let entry = inner
            .entries
            .entry(key.to_string())
            .or_insert_with(|| StoredEntry {
                payload: KeyedPayload::Set(HashSet::new()),
                expires_at,
            });

        // A logically expired entry starts over rather than resurrecting old members
        if !entry.is_live(now) {
            entry.payload = KeyedPayload::Set(HashSet::new());
        }
        entry.expires_at = expires_at;

        if let KeyedPayload::Set(members) = &mut entry.payload {
            members.insert(value);
        } else {
            debug!(key = %key, "Replacing counter payload with set");
            entry.payload = KeyedPayload::Set(HashSet::from([value]));
        }

        debug!(key = %key, ttl_ms = ttl.as_millis() as u64, "Set member added");
    }

    /// Members of the set at `key`, sorted. Empty if absent, expired, or a counter.
    pub fn get_set(&self, key: &str) -> Vec<String> {
        let inner = self.lock();
        let mut members: Vec<String> = match inner.live_entry(key, Instant::now()) {
            Some(StoredEntry {
                payload: KeyedPayload::Set(members),
                ..
            }) => members.iter().cloned().collect(),
            _ => Vec::new(),
        };
        members.sort();
        members
    }

    pub fn has(&self, key: &str, value: &str) -> bool {
        let inner = self.lock();
        matches!(
            inner.live_entry(key, Instant::now()),
            Some(StoredEntry { payload: KeyedPayload::Set(members), .. }) if members.contains(value)
        )
    }

    /// Removes one member. The key's deadline is left untouched.
    pub fn remove_from_set(&self, key: &str, value: &str) -> bool {
        let now = Instant::now();
        let mut inner = self.lock();
        match inner.entries.get_mut(key) {
            Some(entry) if entry.is_live(now) => match &mut entry.payload {
                KeyedPayload::Set(members) => members.remove(value),
                KeyedPayload::Counter(_) => false,
            },
            _ => false,
        }
    }

    /// Adds `delta` to the counter at `key` using the default TTL
    pub fn add_to_number(&self, key: &str, delta: i64) -> i64 {
        self.add_to_number_with_ttl(key, delta, self.config.default_ttl)
    }

    /// Adds `delta` to the counter at `key` (starting from 0) and renews the key.
    ///
    /// Returns the updated value. A set payload at `key` is replaced.
    pub fn add_to_number_with_ttl(&self, key: &str, delta: i64, ttl: Duration) -> i64 {
        let now = Instant::now();
        let mut inner = self.lock();

        let expires_at = inner.renew(key, ttl, now);
        let entry = inner
            .entries
            .entry(key.to_string())
            .or_insert_with(|| StoredEntry {
                payload: KeyedPayload::Counter(0),
                expires_at,
            });

        let base = match (&entry.payload, entry.is_live(now)) {
            (KeyedPayload::Counter(current), true) => *current,
            (KeyedPayload::Set(_), true) => {
                debug!(key = %key, "Replacing set payload with counter");
                0
            }
            (_, false) => 0,
        };
        let value = base.saturating_add(delta);
        entry.payload = KeyedPayload::Counter(value);
        entry.expires_at = expires_at;

        debug!(key = %key, value = value, ttl_ms = ttl.as_millis() as u64, "Counter updated");
        value
    }

    pub fn get_number(&self, key: &str) -> Option<i64> {
        let inner = self.lock();
        match inner.live_entry(key, Instant::now()) {
            Some(StoredEntry {
                payload: KeyedPayload::Counter(value),
                ..
            }) => Some(*value),
            _ => None,
        }
    }

    /// Removes the counter at `key` along with its schedule.
    ///
    /// Does nothing if the key is absent or holds a set.
    pub fn delete_number(&self, key: &str) {
        let mut inner = self.lock();
        if matches!(
            inner.entries.get(key),
            Some(StoredEntry {
                payload: KeyedPayload::Counter(_),
                ..
            })
        ) {
            inner.evict(key);
        }
    }

    /// Drops the payload and any pending expiry for `key`. Idempotent.
    pub fn clear(&self, key: &str) {
        if self.lock().evict(key) {
            debug!(key = %key, "Key cleared");
        }
    }

    /// Pops and evicts every key whose deadline is at or before now.
    ///
    /// Returns the number of keys evicted.
    pub fn sweep_expired(&self) -> usize {
        let now = Instant::now();
        let mut inner = self.lock();
        let mut evicted = 0;

        while inner.scheduler.peek().is_some_and(|entry| entry.is_due(now)) {
            if let Some(due) = inner.scheduler.pop() {
                inner.entries.remove(&due.key);
                evicted += 1;
            }
        }

        evicted
    }

    /// Number of keys currently held, including logically expired ones the
    /// reaper has not swept yet
    pub fn len(&self) -> usize {
        self.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of pending expiry entries
    pub fn scheduled_len(&self) -> usize {
        self.lock().scheduler.len()
    }
}

impl Default for TtlKeySetStore {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for TtlKeySetStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TtlKeySetStore")
            .field("keys", &self.len())
            .field("scheduled", &self.scheduled_len())
            .field("config", &self.config)
            .finish()
    }
}
