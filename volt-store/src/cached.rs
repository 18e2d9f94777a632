use std::sync::Arc;

use volt_cache::L1Cache;

use crate::composite::CompositeStore;
use crate::error::StoreError;
use crate::resource::{Resource, Stored};

/// Read-through cache front for a composite store.
///
/// Lookups by id and by name are cached under separate keys; every
/// mutation deletes the affected entries before touching the store, since
/// the cache has no invalidation protocol of its own.
pub struct CachedStore<T> {
    inner: CompositeStore<T>,
    cache: Arc<L1Cache<String, Stored<T>>>,
}

fn id_key(id: &str) -> String {
    format!("id:{id}")
}

fn name_key(name: &str) -> String {
    format!("name:{name}")
}

impl<T: Resource> CachedStore<T> {
    pub fn new(inner: CompositeStore<T>, cache: Arc<L1Cache<String, Stored<T>>>) -> Self {
        Self { inner, cache }
    }

    pub fn store(&self) -> &CompositeStore<T> {
        &self.inner
    }

    pub async fn get(&self, id: &str) -> Result<Stored<T>, StoreError> {
        if let Some(stored) = self.cache.get(&id_key(id)) {
            return Ok(stored);
        }
        let stored = self.inner.get(id).await?;
        self.populate(&stored);
        Ok(stored)
    }

    pub async fn get_by_name(&self, name: &str) -> Result<Stored<T>, StoreError> {
        if let Some(stored) = self.cache.get(&name_key(name)) {
            return Ok(stored);
        }
        let stored = self.inner.get_by_name(name).await?;
        self.populate(&stored);
        Ok(stored)
    }

    /// List is never cached; it reflects the stores directly.
    pub async fn list(&self) -> Result<Vec<Stored<T>>, StoreError> {
        self.inner.list().await
    }

    pub async fn create(&self, resource: &T) -> Result<(), StoreError> {
        self.invalidate(resource.id(), resource.name());
        self.inner.create(resource).await
    }

    pub async fn update(&self, resource: &T) -> Result<(), StoreError> {
        // The stored name may differ from the incoming one; drop both.
        if let Ok(previous) = self.inner.get(resource.id()).await {
            self.invalidate(previous.resource.id(), previous.resource.name());
        }
        self.invalidate(resource.id(), resource.name());
        self.inner.update(resource).await
    }

    pub async fn delete(&self, id: &str) -> Result<(), StoreError> {
        if let Ok(previous) = self.inner.get(id).await {
            self.invalidate(previous.resource.id(), previous.resource.name());
        }
        self.inner.delete(id).await
    }

    fn populate(&self, stored: &Stored<T>) {
        self.cache.set(id_key(stored.resource.id()), stored.clone());
        self.cache
            .set(name_key(stored.resource.name()), stored.clone());
    }

    fn invalidate(&self, id: &str, name: &str) {
        self.cache.delete(&id_key(id));
        self.cache.delete(&name_key(name));
    }
}
