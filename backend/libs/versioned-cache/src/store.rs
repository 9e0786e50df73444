//! Version counter store
//!
//! One key-value service used two ways: as the envelope store (one
//! `(version, content)` pair per scope) and as the counter store (one change
//! counter and one read counter per scope). No key ever gets a TTL.

use crate::{CacheError, CacheResult, Envelope, KeySchema, Scope};
use dashmap::DashMap;
use redis::AsyncCommands;
use redis_utils::SharedConnectionManager;
use tracing::debug;

#[async_trait::async_trait]
pub trait VersionStore: Send + Sync {
    /// Atomically increment the scope's change counter and return the new value.
    /// An absent counter starts from 0, so the first bump returns 1.
    async fn increment_counter(&self, scope: &Scope) -> CacheResult<i64>;

    /// Current change counter, `None` if no bump was ever recorded.
    async fn read_counter(&self, scope: &Scope) -> CacheResult<Option<i64>>;

    async fn read_envelope(&self, scope: &Scope) -> CacheResult<Option<Envelope>>;

    /// Unconditional overwrite, no expiry.
    async fn write_envelope(&self, scope: &Scope, envelope: &Envelope) -> CacheResult<()>;

    /// Atomically increment the scope's read counter.
    async fn increment_read_counter(&self, scope: &Scope) -> CacheResult<i64>;

    async fn ping(&self) -> CacheResult<()>;
}

fn parse_counter(key: &str, raw: &str) -> CacheResult<i64> {
    raw.trim()
        .parse::<i64>()
        .map_err(|e| CacheError::InvalidCounter(format!("{}='{}': {}", key, raw, e)))
}

/// Redis-backed store: `INCR` for counters, `GET`/`SET` for envelopes.
#[derive(Clone)]
pub struct RedisVersionStore {
    redis: SharedConnectionManager,
    keys: KeySchema,
}

impl RedisVersionStore {
    pub fn new(redis: SharedConnectionManager, keys: KeySchema) -> Self {
        Self { redis, keys }
    }
}

#[async_trait::async_trait]
impl VersionStore for RedisVersionStore {
    async fn increment_counter(&self, scope: &Scope) -> CacheResult<i64> {
        let key = self.keys.change_counter(scope);
        let mut conn = self.redis.lock().await;
        let value: i64 = conn.incr(&key, 1i64).await?;
        debug!(key = %key, counter = value, "Change counter bumped");
        Ok(value)
    }

    async fn read_counter(&self, scope: &Scope) -> CacheResult<Option<i64>> {
        let key = self.keys.change_counter(scope);
        let mut conn = self.redis.lock().await;
        let raw: Option<String> = conn.get(&key).await?;
        raw.map(|v| parse_counter(&key, &v)).transpose()
    }

    async fn read_envelope(&self, scope: &Scope) -> CacheResult<Option<Envelope>> {
        let key = self.keys.envelope(scope);
        let raw: Option<String> = {
            let mut conn = self.redis.lock().await;
            conn.get(&key).await?
        };
        raw.map(|v| Envelope::decode(&v)).transpose()
    }

    async fn write_envelope(&self, scope: &Scope, envelope: &Envelope) -> CacheResult<()> {
        let key = self.keys.envelope(scope);
        let raw = envelope.encode()?;
        let mut conn = self.redis.lock().await;
        conn.set::<_, _, ()>(&key, raw).await?;
        debug!(key = %key, version = envelope.version, "Envelope written");
        Ok(())
    }

    async fn increment_read_counter(&self, scope: &Scope) -> CacheResult<i64> {
        let key = self.keys.read_counter(scope);
        let mut conn = self.redis.lock().await;
        let value: i64 = conn.incr(&key, 1i64).await?;
        Ok(value)
    }

    async fn ping(&self) -> CacheResult<()> {
        let mut conn = self.redis.lock().await;
        let pong: String = redis::cmd("PING").query_async(&mut *conn).await?;
        if pong == "PONG" {
            Ok(())
        } else {
            Err(CacheError::Unavailable(format!(
                "unexpected PING response: {}",
                pong
            )))
        }
    }
}

/// In-process store with the same key layout as the Redis store.
///
/// Counter increments happen under the map's shard lock, so they are atomic
/// across concurrent callers.
#[derive(Default)]
pub struct MemoryVersionStore {
    keys: KeySchema,
    counters: DashMap<String, i64>,
    envelopes: DashMap<String, String>,
}

impl MemoryVersionStore {
    pub fn new(keys: KeySchema) -> Self {
        Self {
            keys,
            counters: DashMap::new(),
            envelopes: DashMap::new(),
        }
    }

    fn incr(&self, key: String) -> i64 {
        let mut entry = self.counters.entry(key).or_insert(0);
        *entry += 1;
        *entry
    }

    /// Raw envelope string, for inspecting what is physically stored.
    pub fn raw_envelope(&self, scope: &Scope) -> Option<String> {
        self.envelopes
            .get(&self.keys.envelope(scope))
            .map(|v| v.value().clone())
    }

    /// Overwrite the raw envelope string (e.g. to plant corrupt content).
    pub fn put_raw_envelope(&self, scope: &Scope, raw: impl Into<String>) {
        self.envelopes.insert(self.keys.envelope(scope), raw.into());
    }
}

#[async_trait::async_trait]
impl VersionStore for MemoryVersionStore {
    async fn increment_counter(&self, scope: &Scope) -> CacheResult<i64> {
        Ok(self.incr(self.keys.change_counter(scope)))
    }

    async fn read_counter(&self, scope: &Scope) -> CacheResult<Option<i64>> {
        Ok(self
            .counters
            .get(&self.keys.change_counter(scope))
            .map(|v| *v.value()))
    }

    async fn read_envelope(&self, scope: &Scope) -> CacheResult<Option<Envelope>> {
        self.raw_envelope(scope)
            .map(|raw| Envelope::decode(&raw))
            .transpose()
    }

    async fn write_envelope(&self, scope: &Scope, envelope: &Envelope) -> CacheResult<()> {
        self.envelopes
            .insert(self.keys.envelope(scope), envelope.encode()?);
        Ok(())
    }

    async fn increment_read_counter(&self, scope: &Scope) -> CacheResult<i64> {
        Ok(self.incr(self.keys.read_counter(scope)))
    }

    async fn ping(&self) -> CacheResult<()> {
        Ok(())
    }
}
