/// Post service - cache-consistent reads and serialized, invalidating writes
use crate::db::{PostStore, StoreError};
use crate::error::{AppError, Result};
use crate::models::{Post, PostInput};
use crate::services::{post_list_scope, post_scope};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, error, info};
use versioned_cache::{RetryConfig, Scope, VersionedCache};

/// Ids are assigned by the store starting at 1
fn validate_id(post_id: i32) -> Result<()> {
    if post_id < 1 {
        return Err(AppError::ValidationError(format!(
            "post id must be positive, got {}",
            post_id
        )));
    }
    Ok(())
}

pub struct PostService {
    store: Arc<dyn PostStore>,
    cache: VersionedCache,
    /// Single writer at a time, held from the durable write through the
    /// counter bumps.
    write_lock: Mutex<()>,
    retry: RetryConfig,
}

impl PostService {
    pub fn new(store: Arc<dyn PostStore>, cache: VersionedCache, retry: RetryConfig) -> Self {
        Self {
            store,
            cache,
            write_lock: Mutex::new(()),
            retry,
        }
    }

    pub fn cache(&self) -> &VersionedCache {
        &self.cache
    }

    /// Get a post by ID
    pub async fn get_post(&self, post_id: i32) -> Result<Post> {
        validate_id(post_id)?;
        let store = &self.store;
        let result = self
            .cache
            .load(&post_scope(post_id), || async move { store.get(post_id).await })
            .await;

        if let Err(StoreError::NotFound(_)) = &result {
            debug!(post_id, "Post not found");
        }
        result.map_err(AppError::from)
    }

    /// Get every post
    pub async fn list_posts(&self) -> Result<Vec<Post>> {
        let store = &self.store;
        self.cache
            .load(&post_list_scope(), || async move { store.list().await })
            .await
            .map_err(AppError::from)
    }

    /// Create a new post, returning its store-assigned id
    pub async fn create_post(&self, input: PostInput) -> Result<i32> {
        let _guard = self.write_lock.lock().await;

        let created = self.store.create(&Post::from_input(input)).await?;

        // No single-entity envelope can exist for a brand new id
        self.invalidate(&[post_list_scope()]).await?;

        info!(post_id = created.id, "Post created");
        Ok(created.id)
    }

    /// Replace a post's fields
    pub async fn update_post(&self, post_id: i32, input: PostInput) -> Result<Post> {
        validate_id(post_id)?;
        let _guard = self.write_lock.lock().await;

        let post = Post::with_id(post_id, input);
        self.store.update(&post).await?;

        self.invalidate(&[post_list_scope(), post_scope(post_id)])
            .await?;

        info!(post_id, "Post updated");
        Ok(post)
    }

    /// Delete a post. Its envelope stays in the cache but goes stale.
    pub async fn delete_post(&self, post_id: i32) -> Result<bool> {
        validate_id(post_id)?;
        let _guard = self.write_lock.lock().await;

        self.store.delete(post_id).await?;

        self.invalidate(&[post_list_scope(), post_scope(post_id)])
            .await?;

        info!(post_id, "Post deleted");
        Ok(true)
    }

    /// Bump every affected scope after a confirmed durable write.
    async fn invalidate(&self, scopes: &[Scope]) -> Result<()> {
        self.cache
            .bump_all(scopes, &self.retry)
            .await
            .map(|_| ())
            .map_err(|e| {
                let scopes: Vec<String> = scopes.iter().map(|s| s.to_string()).collect();
                error!(
                    scopes = ?scopes,
                    error = %e,
                    "Write persisted but cache invalidation failed"
                );
                AppError::InvalidationFailed(format!(
                    "the change was saved, but cached reads of {} may be stale: {}",
                    scopes.join(", "),
                    e
                ))
            })
    }
}
