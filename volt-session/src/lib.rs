//! Session context store for Volt.
//!
//! Holds one value per in-flight flow, keyed by the server-generated flow
//! id. Entries expire after the configured validity period and are lazily
//! removed on access. Absence is expressed as `None`, never as an error.

use std::time::{Duration, Instant};

use dashmap::DashMap;
use uuid::Uuid;

/// Default validity period for an in-flight flow: ten minutes.
pub const DEFAULT_VALIDITY: Duration = Duration::from_secs(600);

struct SessionEntry<V> {
    value: V,
    expires_at: Instant,
}

/// A thread-safe TTL store for in-flight flow contexts, keyed by flow id.
///
/// `get` never returns an expired entry: the expiry check happens on access
/// and the stale entry is removed in the same call. All operations are safe
/// for concurrent use; serializing requests *within* one flow is the
/// caller's job.
pub struct SessionStore<V> {
    inner: DashMap<Uuid, SessionEntry<V>>,
    validity: Duration,
}

impl<V: Clone> SessionStore<V> {
    /// Create a store with the default ten-minute validity period.
    pub fn new() -> Self {
        Self::with_validity(DEFAULT_VALIDITY)
    }

    /// Create a store with a custom validity period.
    pub fn with_validity(validity: Duration) -> Self {
        Self {
            inner: DashMap::new(),
            validity,
        }
    }

    /// Insert or replace the context for `flow_id`, restarting its TTL.
    pub fn add(&self, flow_id: Uuid, value: V) {
        self.inner.insert(
            flow_id,
            SessionEntry {
                value,
                expires_at: Instant::now() + self.validity,
            },
        );
    }

    /// Get the context for `flow_id` if it exists and has not expired.
    ///
    /// An expired entry is removed here and reported as absent.
    pub fn get(&self, flow_id: &Uuid) -> Option<V> {
        if let Some(entry) = self.inner.get(flow_id) {
            if Instant::now() < entry.expires_at {
                return Some(entry.value.clone());
            }
            // Expired — drop the read guard before removing
            drop(entry);
            self.inner.remove(flow_id);
        }
        None
    }

    /// Remove the context for `flow_id`, if any.
    pub fn clear(&self, flow_id: &Uuid) {
        self.inner.remove(flow_id);
    }

    /// Remove every stored context.
    pub fn clear_all(&self) {
        self.inner.clear();
    }

    /// Number of stored entries, including not-yet-collected expired ones.
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}

impl<V: Clone> Default for SessionStore<V> {
    fn default() -> Self {
        Self::new()
    }
}
