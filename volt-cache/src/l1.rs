use std::hash::Hash;
use std::num::NonZeroUsize;
use std::sync::{Arc, RwLock};
use std::time::{Duration, Instant};

use lru::LruCache;
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// Cache tuning knobs.
#[derive(Clone, Debug)]
pub struct CacheConfig {
    /// Master switch. A disabled cache turns every operation into a no-op.
    pub enabled: bool,
    /// Entry time-to-live.
    pub ttl: Duration,
    /// Upper bound on the number of entries.
    pub max_size: usize,
    /// How often the background sweeper removes expired entries.
    pub cleanup_interval: Duration,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            ttl: Duration::from_secs(600),
            max_size: 1000,
            cleanup_interval: Duration::from_secs(300),
        }
    }
}

/// Point-in-time cache statistics.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct CacheStats {
    pub hit_count: u64,
    pub miss_count: u64,
    pub evict_count: u64,
    pub size: usize,
    pub max_size: usize,
}

impl CacheStats {
    /// Fraction of lookups served from the cache; `0.0` before any lookup.
    pub fn hit_rate(&self) -> f64 {
        let total = self.hit_count + self.miss_count;
        if total == 0 {
            0.0
        } else {
            self.hit_count as f64 / total as f64
        }
    }
}

struct CacheEntry<V> {
    value: V,
    expires_at: Instant,
}

struct CacheInner<K: Hash + Eq, V> {
    entries: LruCache<K, CacheEntry<V>>,
    hit_count: u64,
    miss_count: u64,
    evict_count: u64,
}

enum Lookup<V> {
    Miss,
    Expired,
    Hit(V),
}

/// TTL + LRU bounded in-memory cache.
///
/// `get` never returns an expired entry: expiry is checked on access and the
/// stale entry removed in the same call, counted as a miss. Inserting a new
/// key into a full cache evicts the least-recently-accessed entry. Both
/// `get` and `set` refresh the touched key's position in the access order,
/// so `get` takes the write lock; only [`is_enabled`](Self::is_enabled) and
/// [`stats`](Self::stats) read.
pub struct L1Cache<K: Hash + Eq, V> {
    inner: RwLock<CacheInner<K, V>>,
    config: CacheConfig,
}

impl<K: Hash + Eq + Clone, V: Clone> L1Cache<K, V> {
    pub fn new(config: CacheConfig) -> Self {
        let capacity =
            NonZeroUsize::new(config.max_size.max(1)).expect("capacity is at least one");
        Self {
            inner: RwLock::new(CacheInner {
                entries: LruCache::new(capacity),
                hit_count: 0,
                miss_count: 0,
                evict_count: 0,
            }),
            config,
        }
    }

    /// Get a cached value if it exists and has not expired.
    ///
    /// A hit moves the key to the front of the access order. An expired
    /// entry is removed here and counted as a miss.
    pub fn get(&self, key: &K) -> Option<V> {
        if !self.config.enabled {
            return None;
        }
        let mut inner = self.inner.write().expect("cache lock poisoned");
        let now = Instant::now();
        let lookup = match inner.entries.get(key) {
            None => Lookup::Miss,
            Some(entry) if now >= entry.expires_at => Lookup::Expired,
            Some(entry) => Lookup::Hit(entry.value.clone()),
        };
        match lookup {
            Lookup::Miss => {
                inner.miss_count += 1;
                None
            }
            Lookup::Expired => {
                inner.entries.pop(key);
                inner.miss_count += 1;
                None
            }
            Lookup::Hit(value) => {
                inner.hit_count += 1;
                Some(value)
            }
        }
    }

    /// Insert or update a value.
    ///
    /// Inserting a new key into a full cache first evicts the
    /// least-recently-accessed entry and bumps the eviction counter, so the
    /// size bound holds at all times outside this call.
    pub fn set(&self, key: K, value: V) {
        if !self.config.enabled {
            return;
        }
        let mut inner = self.inner.write().expect("cache lock poisoned");
        let at_capacity = inner.entries.len() == inner.entries.cap().get();
        if at_capacity && !inner.entries.contains(&key) {
            if inner.entries.pop_lru().is_some() {
                inner.evict_count += 1;
            }
        }
        let expires_at = Instant::now() + self.config.ttl;
        inner.entries.put(key, CacheEntry { value, expires_at });
    }

    /// Remove a single entry.
    pub fn delete(&self, key: &K) {
        if !self.config.enabled {
            return;
        }
        let mut inner = self.inner.write().expect("cache lock poisoned");
        inner.entries.pop(key);
    }

    /// Remove all entries. Statistics are kept.
    pub fn clear(&self) {
        if !self.config.enabled {
            return;
        }
        let mut inner = self.inner.write().expect("cache lock poisoned");
        inner.entries.clear();
    }

    /// Remove every expired entry, returning how many were removed.
    ///
    /// Sweep removals are not evictions; `evict_count` tracks LRU pressure
    /// only.
    pub fn cleanup_expired(&self) -> usize {
        if !self.config.enabled {
            return 0;
        }
        let mut inner = self.inner.write().expect("cache lock poisoned");
        let now = Instant::now();
        let expired: Vec<K> = inner
            .entries
            .iter()
            .filter(|(_, entry)| now >= entry.expires_at)
            .map(|(key, _)| key.clone())
            .collect();
        for key in &expired {
            inner.entries.pop(key);
        }
        expired.len()
    }

    pub fn is_enabled(&self) -> bool {
        self.config.enabled
    }

    /// Number of live entries (including not-yet-swept expired ones).
    pub fn len(&self) -> usize {
        self.inner
            .read()
            .expect("cache lock poisoned")
            .entries
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn stats(&self) -> CacheStats {
        let inner = self.inner.read().expect("cache lock poisoned");
        CacheStats {
            hit_count: inner.hit_count,
            miss_count: inner.miss_count,
            evict_count: inner.evict_count,
            size: inner.entries.len(),
            max_size: self.config.max_size,
        }
    }
}

impl<K, V> L1Cache<K, V>
where
    K: Hash + Eq + Clone + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
{
    /// Spawn the periodic sweeper. It runs every `cleanup_interval` until
    /// the token is cancelled.
    pub fn spawn_sweeper(self: &Arc<Self>, cancel: CancellationToken) -> tokio::task::JoinHandle<()> {
        let cache = Arc::clone(self);
        let period = cache.config.cleanup_interval;
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            loop {
                tokio::select! {
                    _ = cancel.cancelled() => break,
                    _ = ticker.tick() => {
                        let removed = cache.cleanup_expired();
                        if removed > 0 {
                            debug!(removed, "swept expired cache entries");
                        }
                    }
                }
            }
        })
    }
}
