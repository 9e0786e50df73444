/// Database access layer
///
/// This module provides:
/// - Database connection pooling
/// - The durable post store contract and its PostgreSQL implementation
/// - Schema bootstrap
pub mod post_repo;

pub use post_repo::PgPostRepository;

use crate::config::DatabaseConfig;
use crate::models::Post;
use sqlx::postgres::{PgPool, PgPoolOptions};
use std::time::Duration;
use thiserror::Error;
use tracing::{error, info};

/// Durable store errors. Not-found is kept apart from every other failure.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("post {0} not found")]
    NotFound(i32),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("store unavailable: {0}")]
    Unavailable(String),
}

pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// CRUD against the durable post table. No caching, no retries.
#[async_trait::async_trait]
pub trait PostStore: Send + Sync {
    async fn get(&self, id: i32) -> StoreResult<Post>;

    async fn list(&self) -> StoreResult<Vec<Post>>;

    /// Insert and return the post with its store-assigned id
    async fn create(&self, post: &Post) -> StoreResult<Post>;

    async fn update(&self, post: &Post) -> StoreResult<()>;

    async fn delete(&self, id: i32) -> StoreResult<()>;

    async fn ping(&self) -> StoreResult<()>;
}

/// Create a PostgreSQL connection pool and verify it with `SELECT 1`
pub async fn create_pool(config: &DatabaseConfig) -> Result<PgPool, sqlx::Error> {
    let pool = PgPoolOptions::new()
        .max_connections(config.max_connections)
        .acquire_timeout(Duration::from_secs(config.acquire_timeout_secs))
        .test_before_acquire(true)
        .connect(&config.url)
        .await?;

    match tokio::time::timeout(
        Duration::from_secs(config.acquire_timeout_secs),
        sqlx::query("SELECT 1").execute(&pool),
    )
    .await
    {
        Ok(Ok(_)) => {
            info!(
                max_connections = config.max_connections,
                "Database pool created and verified successfully"
            );
            Ok(pool)
        }
        Ok(Err(e)) => {
            error!(error = %e, "Database connection verification failed");
            Err(e)
        }
        Err(_) => {
            error!(
                timeout_secs = config.acquire_timeout_secs,
                "Database connection verification timeout"
            );
            Err(sqlx::Error::Io(std::io::Error::new(
                std::io::ErrorKind::TimedOut,
                "Database verification timeout",
            )))
        }
    }
}

/// Create the posts table if it does not exist yet
pub async fn ensure_schema(pool: &PgPool) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS posts (
            id          SERIAL PRIMARY KEY,
            title       TEXT NOT NULL DEFAULT '',
            description TEXT NOT NULL DEFAULT '',
            short_text  TEXT NOT NULL DEFAULT '',
            full_text   TEXT NOT NULL DEFAULT '',
            uri         TEXT NOT NULL DEFAULT ''
        )
        "#,
    )
    .execute(pool)
    .await?;

    info!("Posts table ensured");
    Ok(())
}
