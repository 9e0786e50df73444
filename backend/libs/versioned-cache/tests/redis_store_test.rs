//! Integration tests for the Redis-backed version store
//!
//! These tests require a running Redis instance.
//! Run with: cargo test -p versioned-cache --test redis_store_test -- --ignored

use redis_utils::{RedisPool, RedisTarget};
use std::sync::Arc;
use versioned_cache::{
    Envelope, KeySchema, Lookup, RedisVersionStore, Scope, VersionStore, VersionedCache,
};

const REDIS_URL: &str = "redis://127.0.0.1:6379";

async fn store() -> RedisVersionStore {
    let pool = RedisPool::connect(&RedisTarget::Url(REDIS_URL.to_string()))
        .await
        .expect("Failed to connect to Redis");
    // Unique namespace per test run so counters start from scratch
    let namespace = format!("versioned-cache-test-{}", rand_suffix());
    RedisVersionStore::new(pool.manager(), KeySchema::new(namespace))
}

fn rand_suffix() -> u64 {
    rand::random::<u64>()
}

#[tokio::test]
#[ignore] // Requires Redis server
async fn test_counter_increment_and_read() {
    let store = store().await;
    let scope = Scope::entity("post-key", 7);

    assert_eq!(store.read_counter(&scope).await.unwrap(), None);
    assert_eq!(store.increment_counter(&scope).await.unwrap(), 1);
    assert_eq!(store.increment_counter(&scope).await.unwrap(), 2);
    assert_eq!(store.read_counter(&scope).await.unwrap(), Some(2));
}

#[tokio::test]
#[ignore] // Requires Redis server
async fn test_envelope_write_and_read() {
    let store = store().await;
    let scope = Scope::collection("post-list");

    store
        .write_envelope(&scope, &Envelope::new(4, "[]".to_string()))
        .await
        .unwrap();

    let envelope = store.read_envelope(&scope).await.unwrap().unwrap();
    assert_eq!(envelope.version, 4);
    assert_eq!(envelope.content, "[]");
}

#[tokio::test]
#[ignore] // Requires Redis server
async fn test_concurrent_increments_are_atomic() {
    let store = Arc::new(store().await);
    let scope = Scope::entity("post-key", 1);

    let tasks: Vec<_> = (0..50)
        .map(|_| {
            let store = store.clone();
            let scope = scope.clone();
            tokio::spawn(async move { store.increment_counter(&scope).await.unwrap() })
        })
        .collect();

    let mut values = Vec::new();
    for task in futures::future::join_all(tasks).await {
        values.push(task.unwrap());
    }
    values.sort_unstable();

    assert_eq!(values, (1..=50).collect::<Vec<i64>>());
}

#[tokio::test]
#[ignore] // Requires Redis server
async fn test_versioned_read_path_over_redis() {
    let store = Arc::new(store().await);
    let cache = VersionedCache::new(store.clone());
    let scope = Scope::entity("post-key", 3);

    let loaded: Result<String, ()> = cache.load(&scope, || async { Ok("T".to_string()) }).await;
    assert_eq!(loaded.unwrap(), "T");
    assert_eq!(cache.lookup::<String>(&scope).await, Lookup::Hit("T".to_string()));

    cache.bump(&scope).await.unwrap();
    assert_eq!(
        cache.lookup::<String>(&scope).await,
        Lookup::Miss { observed: 2 }
    );
}
