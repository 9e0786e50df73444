//! Versioned cache layer
//!
//! Read-through / write-invalidate caching driven by per-scope change counters:
//! - Envelopes tagged with the counter value they were cached under
//! - Lazy staleness detection (no envelope is ever deleted)
//! - Atomic counter bumps via the store's native increment
//! - Bounded retry for post-write invalidation
//! - Metrics integration

mod envelope;
mod error;
mod keys;
mod metrics;
mod retry;
mod store;
mod versioned;

pub use envelope::Envelope;
pub use error::{CacheError, CacheResult};
pub use keys::{KeySchema, Scope, DEFAULT_NAMESPACE};
pub use metrics::CacheMetrics;
pub use retry::{with_retry, RetryConfig};
pub use store::{MemoryVersionStore, RedisVersionStore, VersionStore};
pub use versioned::{Lookup, VersionedCache};
