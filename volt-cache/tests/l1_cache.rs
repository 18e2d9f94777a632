use std::sync::Arc;
use std::thread::sleep;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use volt_cache::{CacheConfig, L1Cache};

fn config(max_size: usize, ttl: Duration) -> CacheConfig {
    CacheConfig {
        enabled: true,
        ttl,
        max_size,
        cleanup_interval: Duration::from_secs(300),
    }
}

#[test]
fn set_then_get_within_ttl() {
    let cache = L1Cache::new(config(10, Duration::from_secs(60)));
    cache.set("k", "v");
    assert_eq!(cache.get(&"k"), Some("v"));
}

#[test]
fn set_is_idempotent() {
    let cache = L1Cache::new(config(10, Duration::from_secs(60)));
    cache.set("k", "v");
    cache.set("k", "v");
    assert_eq!(cache.get(&"k"), Some("v"));
    assert_eq!(cache.len(), 1);
}

#[test]
fn expired_entry_is_a_miss_and_removed() {
    let cache = L1Cache::new(config(10, Duration::from_millis(30)));
    cache.set("k", "v");
    sleep(Duration::from_millis(40));
    assert_eq!(cache.get(&"k"), None);
    // The expired entry was removed in the same call.
    assert_eq!(cache.len(), 0);
    let stats = cache.stats();
    assert_eq!(stats.miss_count, 1);
    assert_eq!(stats.hit_count, 0);
}

#[test]
fn lru_eviction_under_pressure() {
    // maxSize=3: a, b, c, touch a, insert d -> b (least recently used) goes.
    let cache = L1Cache::new(config(3, Duration::from_secs(60)));
    cache.set("a", 1);
    cache.set("b", 2);
    cache.set("c", 3);
    assert_eq!(cache.get(&"a"), Some(1));
    cache.set("d", 4);

    assert_eq!(cache.get(&"b"), None);
    assert_eq!(cache.get(&"a"), Some(1));
    assert_eq!(cache.get(&"c"), Some(3));
    assert_eq!(cache.get(&"d"), Some(4));
    assert_eq!(cache.stats().evict_count, 1);
}

#[test]
fn size_never_exceeds_max() {
    let cache = L1Cache::new(config(5, Duration::from_secs(60)));
    for i in 0..50 {
        cache.set(i, i);
        assert!(cache.len() <= 5);
    }
    assert_eq!(cache.len(), 5);
    assert_eq!(cache.stats().evict_count, 45);
}

#[test]
fn overwriting_existing_key_does_not_evict() {
    let cache = L1Cache::new(config(2, Duration::from_secs(60)));
    cache.set("a", 1);
    cache.set("b", 2);
    cache.set("a", 10);
    assert_eq!(cache.get(&"a"), Some(10));
    assert_eq!(cache.get(&"b"), Some(2));
    assert_eq!(cache.stats().evict_count, 0);
}

#[test]
fn delete_and_clear() {
    let cache = L1Cache::new(config(10, Duration::from_secs(60)));
    cache.set("a", 1);
    cache.set("b", 2);
    cache.delete(&"a");
    assert_eq!(cache.get(&"a"), None);
    cache.clear();
    assert_eq!(cache.get(&"b"), None);
    assert!(cache.is_empty());
}

#[test]
fn disabled_cache_is_a_no_op() {
    let cache = L1Cache::new(CacheConfig {
        enabled: false,
        ..config(10, Duration::from_secs(60))
    });
    cache.set("k", "v");
    assert_eq!(cache.get(&"k"), None);
    assert!(!cache.is_enabled());
    assert_eq!(cache.stats().size, 0);
}

#[test]
fn hit_rate_tracks_lookups() {
    let cache = L1Cache::new(config(10, Duration::from_secs(60)));
    assert_eq!(cache.stats().hit_rate(), 0.0);
    cache.set("k", "v");
    cache.get(&"k");
    cache.get(&"missing");
    let stats = cache.stats();
    assert_eq!(stats.hit_count, 1);
    assert_eq!(stats.miss_count, 1);
    assert!((stats.hit_rate() - 0.5).abs() < f64::EPSILON);
}

#[test]
fn cleanup_removes_only_expired_entries() {
    let cache = L1Cache::new(config(10, Duration::from_millis(30)));
    cache.set("old", 1);
    sleep(Duration::from_millis(40));
    cache.set("fresh", 2);
    let removed = cache.cleanup_expired();
    assert_eq!(removed, 1);
    assert_eq!(cache.len(), 1);
    assert_eq!(cache.get(&"fresh"), Some(2));
    // Sweep removals are not LRU evictions.
    assert_eq!(cache.stats().evict_count, 0);
}

#[tokio::test]
async fn sweeper_runs_and_stops_on_cancel() {
    let cache = Arc::new(L1Cache::new(CacheConfig {
        enabled: true,
        ttl: Duration::from_millis(10),
        max_size: 10,
        cleanup_interval: Duration::from_millis(20),
    }));
    cache.set("k".to_string(), 1u32);

    let cancel = CancellationToken::new();
    let handle = cache.spawn_sweeper(cancel.clone());

    tokio::time::sleep(Duration::from_millis(80)).await;
    assert_eq!(cache.len(), 0);

    cancel.cancel();
    handle.await.expect("sweeper task panicked");
}
