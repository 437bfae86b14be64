//! In-memory memoization with a time-to-live.
//!
//! The cache is an explicit value handed to the pipeline, and time comes from
//! an injectable [`Clock`], so expiry is deterministic under test.

use std::collections::HashMap;
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use crate::options::PulseOptions;

/// Source of monotonic time.
pub trait Clock: Send + Sync {
    fn now(&self) -> Instant;
}

/// Wall clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

impl<C: Clock + ?Sized> Clock for Arc<C> {
    fn now(&self) -> Instant {
        (**self).now()
    }
}

/// Clock that only moves when told to.
#[derive(Debug)]
pub struct ManualClock {
    base: Instant,
    offset: Mutex<Duration>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self {
            base: Instant::now(),
            offset: Mutex::new(Duration::ZERO),
        }
    }

    pub fn advance(&self, by: Duration) {
        let mut offset = self.offset.lock().unwrap_or_else(|e| e.into_inner());
        *offset += by;
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        self.base + *self.offset.lock().unwrap_or_else(|e| e.into_inner())
    }
}

/// Opaque cache key. Built from a hash so credentials are never stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MemoKey(u64);

impl MemoKey {
    /// Key for one aggregation: credential fingerprint plus every option that
    /// changes what is fetched.
    pub fn for_cycle(credential: &str, options: &PulseOptions) -> Self {
        let mut hasher = DefaultHasher::new();
        credential.hash(&mut hasher);
        options.org_scope.hash(&mut hasher);
        options.window_days.hash(&mut hasher);
        options.repo_fetch_limit.hash(&mut hasher);
        options.max_batch_repos.hash(&mut hasher);
        options.commit_budget.hash(&mut hasher);
        options.per_repo_cap.hash(&mut hasher);
        options.commits_per_repo.hash(&mut hasher);
        options.pr_limit.hash(&mut hasher);
        options.branches_per_repo.hash(&mut hasher);
        Self(hasher.finish())
    }
}

struct Entry<V> {
    value: V,
    stored_at: Instant,
}

/// TTL cache keyed by [`MemoKey`].
pub struct MemoCache<V, C = SystemClock> {
    ttl: Duration,
    clock: C,
    entries: Mutex<HashMap<MemoKey, Entry<V>>>,
}

impl<V: Clone> MemoCache<V, SystemClock> {
    pub fn new(ttl: Duration) -> Self {
        Self::with_clock(ttl, SystemClock)
    }
}

impl<V: Clone, C: Clock> MemoCache<V, C> {
    pub fn with_clock(ttl: Duration, clock: C) -> Self {
        Self {
            ttl,
            clock,
            entries: Mutex::new(HashMap::new()),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// A fresh value and its age. Expired entries are evicted on access.
    pub fn get(&self, key: &MemoKey) -> Option<(V, Duration)> {
        let now = self.clock.now();
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        let age = now.saturating_duration_since(entries.get(key)?.stored_at);
        if age >= self.ttl {
            entries.remove(key);
            return None;
        }
        entries.get(key).map(|entry| (entry.value.clone(), age))
    }

    pub fn insert(&self, key: MemoKey, value: V) {
        let stored_at = self.clock.now();
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        entries.insert(key, Entry { value, stored_at });
    }

    /// Drop everything, e.g. on an explicit refresh.
    pub fn clear(&self) {
        self.entries
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clear();
    }

    pub fn len(&self) -> usize {
        self.entries.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<V, C> std::fmt::Debug for MemoCache<V, C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoCache")
            .field("ttl", &self.ttl)
            .finish_non_exhaustive()
    }
}
