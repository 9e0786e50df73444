/// Per-post read counter. Not part of the cache consistency protocol: writes
/// never reset it and cache hits count the same as misses.
use crate::error::{AppError, Result};
use crate::services::post_scope;
use std::sync::Arc;
use tracing::warn;
use versioned_cache::VersionStore;

#[derive(Clone)]
pub struct ReadCounter {
    store: Arc<dyn VersionStore>,
}

impl ReadCounter {
    pub fn new(store: Arc<dyn VersionStore>) -> Self {
        Self { store }
    }

    /// Count one read of `post_id` and return the new total
    pub async fn bump(&self, post_id: i32) -> Result<i64> {
        self.store
            .increment_read_counter(&post_scope(post_id))
            .await
            .map_err(|e| {
                warn!(post_id, error = %e, "Read counter increment failed");
                AppError::CacheError(e.to_string())
            })
    }
}
