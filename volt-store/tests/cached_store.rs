use std::sync::Arc;
use std::time::Duration;

use sqlx::sqlite::SqlitePoolOptions;
use volt_cache::{CacheConfig, L1Cache};
use volt_store::{
    init_schema, CachedStore, CompositeStore, DbStore, FileStore, IdentityProvider, Stored,
};

async fn cached_store() -> (CachedStore<IdentityProvider>, Arc<L1Cache<String, Stored<IdentityProvider>>>) {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .expect("connect in-memory sqlite");
    init_schema(&pool).await.expect("create schema");
    let cache = Arc::new(L1Cache::new(CacheConfig {
        enabled: true,
        ttl: Duration::from_secs(60),
        max_size: 16,
        cleanup_interval: Duration::from_secs(300),
    }));
    let composite = CompositeStore::new(FileStore::empty(), DbStore::new(pool));
    (CachedStore::new(composite, cache.clone()), cache)
}

fn idp(id: &str, name: &str) -> IdentityProvider {
    IdentityProvider {
        id: id.into(),
        name: name.into(),
        description: String::new(),
        idp_type: "OIDC".into(),
        properties: Vec::new(),
    }
}

#[tokio::test]
async fn get_populates_the_cache() {
    let (store, cache) = cached_store().await;
    store.create(&idp("okta-1", "Okta")).await.expect("create");

    store.get("okta-1").await.expect("first get");
    let before = cache.stats();
    store.get("okta-1").await.expect("second get");
    let after = cache.stats();
    assert_eq!(after.hit_count, before.hit_count + 1);

    // The name key was populated by the id lookup.
    store.get_by_name("Okta").await.expect("get by name");
    assert_eq!(cache.stats().hit_count, after.hit_count + 1);
}

#[tokio::test]
async fn update_invalidates_stale_entries() {
    let (store, _cache) = cached_store().await;
    store.create(&idp("okta-1", "Okta")).await.expect("create");
    store.get("okta-1").await.expect("warm cache");

    let mut renamed = idp("okta-1", "Okta EU");
    renamed.description = "moved".into();
    store.update(&renamed).await.expect("update");

    let stored = store.get("okta-1").await.expect("get after update");
    assert_eq!(stored.resource.name, "Okta EU");
    // The old name no longer resolves, from cache or store.
    assert!(store.get_by_name("Okta").await.is_err());
}

#[tokio::test]
async fn delete_invalidates_both_keys() {
    let (store, _cache) = cached_store().await;
    store.create(&idp("okta-1", "Okta")).await.expect("create");
    store.get("okta-1").await.expect("warm cache");
    store.get_by_name("Okta").await.expect("warm name key");

    store.delete("okta-1").await.expect("delete");
    assert!(store.get("okta-1").await.is_err());
    assert!(store.get_by_name("Okta").await.is_err());
}
