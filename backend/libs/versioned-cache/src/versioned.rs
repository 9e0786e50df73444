//! Versioned read-through / write-invalidate protocol
//!
//! Read path for a scope:
//! 1. observe the change counter (absent means 0)
//! 2. read the envelope; absent is a miss
//! 3. an envelope whose version is below the observed counter is stale and
//!    treated as a miss, otherwise its content is the hit
//! 4. on a miss, run the loader, bump the counter and store the loaded value
//!    under the bumped version
//!
//! Writers never touch envelopes. They bump the counters of the scopes they
//! affect, which makes every older envelope stale for the next reader.

use crate::{with_retry, CacheError, CacheMetrics, CacheResult, Envelope, RetryConfig, Scope, VersionStore};
use serde::{de::DeserializeOwned, Serialize};
use std::future::Future;
use std::sync::Arc;
use tracing::{debug, warn};

/// Outcome of consulting the cache before hitting the source of truth.
#[derive(Debug, PartialEq)]
pub enum Lookup<T> {
    Hit(T),
    /// Missing, stale or undecodable envelope; carries the counter observed
    /// before the envelope was read.
    Miss { observed: i64 },
    /// The cache store could not be consulted; skip repopulation.
    Bypass,
}

#[derive(Clone)]
pub struct VersionedCache {
    store: Arc<dyn VersionStore>,
    metrics: CacheMetrics,
}

impl VersionedCache {
    pub fn new(store: Arc<dyn VersionStore>) -> Self {
        Self {
            store,
            metrics: CacheMetrics::new(),
        }
    }

    /// Steps 1-3 of the read path.
    pub async fn lookup<T: DeserializeOwned>(&self, scope: &Scope) -> Lookup<T> {
        let observed = match self.store.read_counter(scope).await {
            Ok(counter) => counter.unwrap_or(0),
            Err(e) => {
                warn!(scope = %scope, error = %e, "Change counter read failed, bypassing cache");
                self.metrics.record_error(scope, "counter_read");
                return Lookup::Bypass;
            }
        };

        let envelope = match self.store.read_envelope(scope).await {
            Ok(Some(envelope)) => envelope,
            Ok(None) => {
                debug!(scope = %scope, "Cache miss");
                self.metrics.record_miss(scope);
                return Lookup::Miss { observed };
            }
            Err(e) if e.is_miss() => {
                warn!(scope = %scope, error = %e, "Envelope decode failed, treating as miss");
                self.metrics.record_error(scope, "deserialize");
                return Lookup::Miss { observed };
            }
            Err(e) => {
                warn!(scope = %scope, error = %e, "Envelope read failed, bypassing cache");
                self.metrics.record_error(scope, "envelope_read");
                return Lookup::Bypass;
            }
        };

        match envelope
            .check_fresh(observed)
            .and_then(|fresh| fresh.unwrap_as::<T>())
        {
            Ok(value) => {
                debug!(scope = %scope, counter = observed, "Cache hit");
                self.metrics.record_hit(scope);
                Lookup::Hit(value)
            }
            Err(CacheError::Stale { stored, current }) => {
                debug!(scope = %scope, stored, current, "Stale envelope rejected");
                self.metrics.record_stale(scope);
                Lookup::Miss { observed }
            }
            Err(e) => {
                warn!(scope = %scope, error = %e, "Envelope content decode failed, treating as miss");
                self.metrics.record_error(scope, "deserialize");
                Lookup::Miss { observed }
            }
        }
    }

    /// Full read path: cached value if trustworthy, otherwise `loader` and
    /// repopulate. Loader errors are returned as-is and never cached.
    pub async fn load<T, E, F, Fut>(&self, scope: &Scope, loader: F) -> Result<T, E>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        let observed = match self.lookup::<T>(scope).await {
            Lookup::Hit(value) => return Ok(value),
            Lookup::Miss { observed } => Some(observed),
            Lookup::Bypass => None,
        };

        let value = loader().await?;

        if let Some(observed) = observed {
            self.repopulate(scope, observed, &value).await;
        }

        Ok(value)
    }

    /// Step 4: bump the scope counter and store `value` under the new version.
    ///
    /// The envelope is written only if the bump returned exactly
    /// `observed + 1`. Any larger value means another bump landed between the
    /// counter observation and now, and `value` may predate a write.
    /// Returns the version written, if any.
    pub async fn repopulate<T: Serialize>(
        &self,
        scope: &Scope,
        observed: i64,
        value: &T,
    ) -> Option<i64> {
        let version = match self.store.increment_counter(scope).await {
            Ok(version) => version,
            Err(e) => {
                warn!(scope = %scope, error = %e, "Counter bump failed during repopulation");
                self.metrics.record_error(scope, "bump");
                return None;
            }
        };
        self.metrics.record_bump(scope);

        if version != observed + 1 {
            debug!(
                scope = %scope,
                observed,
                version,
                "Concurrent bump detected, skipping envelope write"
            );
            self.metrics.record_skipped_write(scope);
            return None;
        }

        let envelope = match Envelope::wrap(version, value) {
            Ok(envelope) => envelope,
            Err(e) => {
                warn!(scope = %scope, error = %e, "Envelope serialization failed");
                self.metrics.record_error(scope, "serialize");
                return None;
            }
        };

        if let Err(e) = self.store.write_envelope(scope, &envelope).await {
            warn!(scope = %scope, error = %e, "Envelope write failed");
            self.metrics.record_error(scope, "envelope_write");
            return None;
        }

        self.metrics.record_write(scope);
        Some(version)
    }

    /// Invalidate one scope.
    pub async fn bump(&self, scope: &Scope) -> CacheResult<i64> {
        let version = self.store.increment_counter(scope).await?;
        self.metrics.record_bump(scope);
        debug!(scope = %scope, version, "Scope invalidated");
        Ok(version)
    }

    /// Invalidate every scope, retrying each bump per `retry`. All scopes are
    /// attempted even if an earlier one fails; the first failure is returned.
    pub async fn bump_all(&self, scopes: &[Scope], retry: &RetryConfig) -> CacheResult<Vec<i64>> {
        let mut versions = Vec::with_capacity(scopes.len());
        let mut first_error = None;

        for scope in scopes {
            match with_retry(retry, || self.bump(scope)).await {
                Ok(version) => versions.push(version),
                Err(e) => {
                    warn!(scope = %scope, error = %e, "Invalidation bump failed after retries");
                    self.metrics.record_error(scope, "bump");
                    first_error.get_or_insert(e);
                }
            }
        }

        match first_error {
            Some(e) => Err(e),
            None => Ok(versions),
        }
    }
}
