//! In-memory fakes for post-service integration tests
//!
//! `MemoryPostStore` stands in for PostgreSQL and `FlakyVersionStore` wraps the
//! in-process version store with failure injection. Store calls suspend at
//! least once so spawned callers genuinely interleave.
#![allow(dead_code)]

use post_service::db::{PostStore, StoreError, StoreResult};
use post_service::models::Post;
use post_service::schema::{build_schema, AppSchema};
use post_service::services::{PostService, ReadCounter};
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, AtomicU32, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::Barrier;
use versioned_cache::{
    CacheError, CacheResult, Envelope, MemoryVersionStore, RetryConfig, Scope, VersionStore,
    VersionedCache,
};

/// Durable store fake with call counting and an outage switch
pub struct MemoryPostStore {
    posts: Mutex<BTreeMap<i32, Post>>,
    next_id: Mutex<i32>,
    failing: AtomicBool,
    get_calls: AtomicUsize,
    list_calls: AtomicUsize,
    /// Reads park here until the expected number of readers arrive
    read_barrier: Mutex<Option<Arc<Barrier>>>,
    writes_in_flight: AtomicUsize,
    max_writes_in_flight: AtomicUsize,
}

impl MemoryPostStore {
    pub fn new() -> Self {
        Self::starting_at(1)
    }

    /// Ids are assigned from `first_id` upwards
    pub fn starting_at(first_id: i32) -> Self {
        Self {
            posts: Mutex::new(BTreeMap::new()),
            next_id: Mutex::new(first_id),
            failing: AtomicBool::new(false),
            get_calls: AtomicUsize::new(0),
            list_calls: AtomicUsize::new(0),
            read_barrier: Mutex::new(None),
            writes_in_flight: AtomicUsize::new(0),
            max_writes_in_flight: AtomicUsize::new(0),
        }
    }

    /// Make `get` and `list` wait until `readers` calls are inside the store
    pub fn hold_reads(&self, readers: usize) {
        *self.read_barrier.lock().unwrap() = Some(Arc::new(Barrier::new(readers)));
    }

    pub fn release_reads(&self) {
        *self.read_barrier.lock().unwrap() = None;
    }

    /// Highest number of writes observed inside the store at once
    pub fn max_writes_in_flight(&self) -> usize {
        self.max_writes_in_flight.load(Ordering::SeqCst)
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn get_calls(&self) -> usize {
        self.get_calls.load(Ordering::SeqCst)
    }

    pub fn list_calls(&self) -> usize {
        self.list_calls.load(Ordering::SeqCst)
    }

    /// Current durable row, bypassing every counter
    pub fn row(&self, id: i32) -> Option<Post> {
        self.posts.lock().unwrap().get(&id).cloned()
    }

    async fn wait_for_readers(&self) {
        let barrier = self.read_barrier.lock().unwrap().clone();
        match barrier {
            Some(barrier) => {
                barrier.wait().await;
            }
            None => tokio::task::yield_now().await,
        }
    }

    fn enter_write(&self) {
        let now = self.writes_in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_writes_in_flight.fetch_max(now, Ordering::SeqCst);
    }

    fn leave_write(&self) {
        self.writes_in_flight.fetch_sub(1, Ordering::SeqCst);
    }

    fn check(&self) -> StoreResult<()> {
        if self.failing.load(Ordering::SeqCst) {
            Err(StoreError::Unavailable("injected outage".into()))
        } else {
            Ok(())
        }
    }
}

#[async_trait::async_trait]
impl PostStore for MemoryPostStore {
    async fn get(&self, id: i32) -> StoreResult<Post> {
        self.get_calls.fetch_add(1, Ordering::SeqCst);
        self.wait_for_readers().await;
        self.check()?;
        self.row(id).ok_or(StoreError::NotFound(id))
    }

    async fn list(&self) -> StoreResult<Vec<Post>> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        self.wait_for_readers().await;
        self.check()?;
        Ok(self.posts.lock().unwrap().values().cloned().collect())
    }

    async fn create(&self, post: &Post) -> StoreResult<Post> {
        self.check()?;
        self.enter_write();
        tokio::task::yield_now().await;
        let created = {
            let mut next_id = self.next_id.lock().unwrap();
            let created = Post {
                id: *next_id,
                ..post.clone()
            };
            *next_id += 1;
            created
        };
        self.posts.lock().unwrap().insert(created.id, created.clone());
        self.leave_write();
        Ok(created)
    }

    async fn update(&self, post: &Post) -> StoreResult<()> {
        self.check()?;
        let mut posts = self.posts.lock().unwrap();
        match posts.get_mut(&post.id) {
            Some(row) => {
                *row = post.clone();
                Ok(())
            }
            None => Err(StoreError::NotFound(post.id)),
        }
    }

    async fn delete(&self, id: i32) -> StoreResult<()> {
        self.check()?;
        self.posts
            .lock()
            .unwrap()
            .remove(&id)
            .map(|_| ())
            .ok_or(StoreError::NotFound(id))
    }

    async fn ping(&self) -> StoreResult<()> {
        self.check()
    }
}

/// Version store wrapper that can fail reads and change-counter increments
#[derive(Default)]
pub struct FlakyVersionStore {
    pub inner: MemoryVersionStore,
    fail_reads: AtomicBool,
    fail_read_counter: AtomicBool,
    /// Number of upcoming change-counter increments to fail
    failing_increments: AtomicU32,
}

impl FlakyVersionStore {
    pub fn set_reads_failing(&self, failing: bool) {
        self.fail_reads.store(failing, Ordering::SeqCst);
    }

    pub fn set_read_counter_failing(&self, failing: bool) {
        self.fail_read_counter.store(failing, Ordering::SeqCst);
    }

    pub fn fail_next_increments(&self, count: u32) {
        self.failing_increments.store(count, Ordering::SeqCst);
    }

    /// Change counter for `scope`, absent as 0
    pub async fn counter(&self, scope: &Scope) -> i64 {
        self.inner.read_counter(scope).await.unwrap().unwrap_or(0)
    }

    fn injected() -> CacheError {
        CacheError::Unavailable("injected outage".into())
    }
}

#[async_trait::async_trait]
impl VersionStore for FlakyVersionStore {
    async fn increment_counter(&self, scope: &Scope) -> CacheResult<i64> {
        let consumed = self
            .failing_increments
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1));
        if consumed.is_ok() {
            return Err(Self::injected());
        }
        self.inner.increment_counter(scope).await
    }

    async fn read_counter(&self, scope: &Scope) -> CacheResult<Option<i64>> {
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(Self::injected());
        }
        self.inner.read_counter(scope).await
    }

    async fn read_envelope(&self, scope: &Scope) -> CacheResult<Option<Envelope>> {
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(Self::injected());
        }
        self.inner.read_envelope(scope).await
    }

    async fn write_envelope(&self, scope: &Scope, envelope: &Envelope) -> CacheResult<()> {
        self.inner.write_envelope(scope, envelope).await
    }

    async fn increment_read_counter(&self, scope: &Scope) -> CacheResult<i64> {
        if self.fail_read_counter.load(Ordering::SeqCst) {
            return Err(Self::injected());
        }
        self.inner.increment_read_counter(scope).await
    }

    async fn ping(&self) -> CacheResult<()> {
        self.inner.ping().await
    }
}

/// Fast retry policy so failure tests stay quick
pub fn quick_retry(max_retries: u32) -> RetryConfig {
    RetryConfig {
        max_retries,
        initial_backoff: Duration::from_millis(1),
        max_backoff: Duration::from_millis(5),
        backoff_multiplier: 2.0,
        jitter: false,
    }
}

pub struct Harness {
    pub store: Arc<MemoryPostStore>,
    pub versions: Arc<FlakyVersionStore>,
    pub service: Arc<PostService>,
    pub read_counter: ReadCounter,
}

impl Harness {
    pub fn new() -> Self {
        Self::with(MemoryPostStore::new(), quick_retry(0))
    }

    pub fn with(store: MemoryPostStore, retry: RetryConfig) -> Self {
        let store = Arc::new(store);
        let versions = Arc::new(FlakyVersionStore::default());
        let service = Arc::new(PostService::new(
            store.clone(),
            VersionedCache::new(versions.clone()),
            retry,
        ));
        let read_counter = ReadCounter::new(versions.clone());
        Self {
            store,
            versions,
            service,
            read_counter,
        }
    }

    pub fn schema(&self) -> AppSchema {
        build_schema(self.service.clone(), self.read_counter.clone())
    }
}
