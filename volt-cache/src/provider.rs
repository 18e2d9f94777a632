use std::any::Any;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use tracing::error;

use crate::l1::{CacheConfig, L1Cache};

/// The cache types Volt provisions, one per cached resource kind.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CacheType {
    IdentityProvider,
    FlowDefinition,
    UserSchema,
    Theme,
    Layout,
}

impl CacheType {
    pub fn as_str(&self) -> &'static str {
        match self {
            CacheType::IdentityProvider => "identity_provider",
            CacheType::FlowDefinition => "flow_definition",
            CacheType::UserSchema => "user_schema",
            CacheType::Theme => "theme",
            CacheType::Layout => "layout",
        }
    }
}

impl std::fmt::Display for CacheType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Process-wide front for the per-type L1 caches.
///
/// Caches are constructed lazily on first request, double-checked under a
/// read-write lock so concurrent first requests build the cache once. Keys
/// are strings (resource ids or names); the value type is fixed by the
/// first caller for a given [`CacheType`]. Requesting an existing cache
/// with a different value type is a wiring bug: it logs an error and
/// returns `None`.
pub struct CacheProvider {
    config: CacheConfig,
    caches: RwLock<HashMap<&'static str, Arc<dyn Any + Send + Sync>>>,
}

impl CacheProvider {
    pub fn new(config: CacheConfig) -> Self {
        Self {
            config,
            caches: RwLock::new(HashMap::new()),
        }
    }

    /// Get or lazily construct the cache for `cache_type`.
    pub fn cache<V>(&self, cache_type: CacheType) -> Option<Arc<L1Cache<String, V>>>
    where
        V: Clone + Send + Sync + 'static,
    {
        let name = cache_type.as_str();
        {
            let caches = self.caches.read().expect("provider lock poisoned");
            if let Some(existing) = caches.get(name) {
                return downcast(name, existing.clone());
            }
        }

        let mut caches = self.caches.write().expect("provider lock poisoned");
        // Double-check: another thread may have built it between the locks.
        if let Some(existing) = caches.get(name) {
            return downcast(name, existing.clone());
        }
        let cache = Arc::new(L1Cache::<String, V>::new(self.config.clone()));
        caches.insert(name, cache.clone() as Arc<dyn Any + Send + Sync>);
        Some(cache)
    }

    pub fn config(&self) -> &CacheConfig {
        &self.config
    }
}

fn downcast<V>(name: &'static str, cache: Arc<dyn Any + Send + Sync>) -> Option<Arc<L1Cache<String, V>>>
where
    V: Clone + Send + Sync + 'static,
{
    match cache.downcast::<L1Cache<String, V>>() {
        Ok(cache) => Some(cache),
        Err(_) => {
            error!(cache = name, "cache already registered with a different value type");
            None
        }
    }
}
