//! Integration Tests for the Cache
//!
//! Exercises the public API end to end, background workers included.

use std::time::Duration;

use fast_cache::cache::{now_unix, KEEP_FALLBACK_TTL_SECS};
use fast_cache::config::MIN_COUNT_LIMIT;
use fast_cache::{Cache, CacheConfig, EvictionStrategy, Ttl};
use tracing_subscriber::EnvFilter;

// == Helper Functions ==

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Sleeps until the wall clock has just entered a new second, so that
/// second-granularity TTL checks in the test do not straddle a boundary.
async fn align_to_second() {
    let start = now_unix();
    while now_unix() == start {
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
}

// == TTL Scenarios ==

#[tokio::test]
async fn test_short_ttl_entries_expire_and_are_swept() {
    init_tracing();
    let cache = Cache::with_interval(1).unwrap();
    cache.set_count_limit(10_000);
    assert_eq!(cache.count_limit(), MIN_COUNT_LIMIT);

    align_to_second().await;
    let keys = ["k1", "k2", "k3", "k4", "k5"];
    for (i, key) in keys.iter().enumerate() {
        cache.set(*key, i, 1);
    }
    for key in keys {
        let (_, ttl) = cache.get(key).expect("entry should be live");
        assert_eq!(ttl, 1);
    }

    tokio::time::sleep(Duration::from_secs(3)).await;

    for key in keys {
        assert!(cache.get(key).is_none(), "{} should have expired", key);
    }
    assert_eq!(cache.len(), 0);
    assert_eq!(cache.stats().expired, 5);

    cache.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_expired_entry_is_absent_before_sweep() {
    let cache = Cache::with_interval(300).unwrap();

    align_to_second().await;
    cache.set("short", "v".to_string(), 1);
    assert!(cache.get("short").is_some());

    tokio::time::sleep(Duration::from_millis(1_100)).await;

    // Logically gone, physically still stored
    assert!(cache.get("short").is_none());
    assert_eq!(cache.len(), 1);

    cache.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_keep_after_write_keeps_original_ttl() {
    let cache = Cache::new().unwrap();

    align_to_second().await;
    cache.set("a", "first".to_string(), 10);
    cache.set("a", "second".to_string(), Ttl::Keep);

    let (value, ttl) = cache.get("a").unwrap();
    assert_eq!(*value, "second");
    assert!(ttl >= 9 && ttl <= 10, "ttl {}", ttl);

    cache.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_keep_on_missing_key_uses_fallback() {
    let cache = Cache::new().unwrap();

    align_to_second().await;
    cache.set("fresh", 1u32, Ttl::Keep);

    assert_eq!(cache.ttl("fresh"), Some(KEEP_FALLBACK_TTL_SECS));
    cache.shutdown().await.unwrap();
}

// == Count Limit Scenarios ==

#[tokio::test]
async fn test_scheduled_eviction_converges_under_limit() {
    init_tracing();
    let cache = Cache::new().unwrap();
    cache.set_count_limit(MIN_COUNT_LIMIT);

    for i in 0..12_000u32 {
        cache.set(format!("key{}", i), i, 3_600);
    }
    assert_eq!(cache.len(), 12_000);

    // Passes at 0.5s, 1.5s and 2.5s each shed 15% of the limit
    tokio::time::sleep(Duration::from_millis(3_200)).await;

    assert!(cache.len() <= MIN_COUNT_LIMIT, "len {}", cache.len());
    assert!(cache.stats().evictions >= 3_000);
    cache.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_scheduled_eviction_keeps_long_lived_entries() {
    let cache = Cache::new().unwrap();
    cache.set_count_limit(MIN_COUNT_LIMIT);

    for i in 0..1_000u32 {
        cache.set(format!("soon{}", i), i, 30);
    }
    for i in 0..MIN_COUNT_LIMIT as u32 {
        cache.set(format!("later{}", i), i, 7_200);
    }

    tokio::time::sleep(Duration::from_millis(900)).await;

    // One pass removes 1500: every short-lived entry goes first
    assert_eq!(cache.len(), 11_000 - 1_500);
    assert!((0..1_000).all(|i| cache.get(&format!("soon{}", i)).is_none()));
    cache.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_inline_eviction_keeps_long_lived_entries() {
    let config = CacheConfig::default()
        .with_count_limit(MIN_COUNT_LIMIT)
        .with_eviction(EvictionStrategy::Inline);
    let cache = Cache::with_config(config).unwrap();

    for i in 0..MIN_COUNT_LIMIT as u32 {
        cache.set(format!("soon{}", i), i, 60);
    }
    for i in 0..1_000u32 {
        cache.set(format!("later{}", i), i, 7_200);
    }

    assert!(cache.len() < MIN_COUNT_LIMIT + 1_000);
    assert!(cache.stats().evictions > 0);
    assert!((0..1_000).all(|i| cache.get(&format!("later{}", i)).is_some()));
    cache.shutdown().await.unwrap();
}

// == Lifecycle ==

#[tokio::test]
async fn test_no_sweep_after_shutdown() {
    let cache = Cache::with_interval(1).unwrap();
    cache.shutdown().await.unwrap();

    cache.set("gone", 1u8, 0);
    tokio::time::sleep(Duration::from_millis(1_500)).await;

    assert!(cache.get("gone").is_none());
    assert_eq!(cache.len(), 1);
    assert_eq!(cache.stats().expired, 0);
}

#[tokio::test]
async fn test_clones_share_entries() {
    let cache = Cache::new().unwrap();
    let other = cache.clone();

    cache.set("shared", vec![1, 2, 3], 60);
    assert_eq!(*other.get("shared").unwrap().0, vec![1, 2, 3]);

    other.shutdown().await.unwrap();
    // Workers are shared too, so this is a no-op
    cache.shutdown().await.unwrap();
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_writers_and_readers() {
    let cache: Cache<u64> = Cache::with_interval(1).unwrap();

    let tasks: Vec<_> = (0..8u64)
        .map(|t| {
            let cache = cache.clone();
            tokio::task::spawn_blocking(move || {
                for i in 0..1_000u64 {
                    cache.set(format!("t{}-{}", t, i % 100), i, 60);
                    cache.get(&format!("t{}-{}", t, (i + 1) % 100));
                }
            })
        })
        .collect();
    for task in tasks {
        task.await.unwrap();
    }

    assert_eq!(cache.len(), 800);
    for t in 0..8u64 {
        assert_eq!(*cache.get(&format!("t{}-99", t)).unwrap().0, 999);
    }
    cache.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_stats_snapshot_serializes() {
    let cache = Cache::new().unwrap();
    cache.set("k", 1u8, 60);
    cache.get("k");
    cache.get("missing");

    let json = serde_json::to_value(cache.stats()).unwrap();
    assert_eq!(json["hits"], 1);
    assert_eq!(json["misses"], 1);
    assert_eq!(json["total_entries"], 1);
    cache.shutdown().await.unwrap();
}
