use super::{PostStore, StoreError, StoreResult};
use crate::models::Post;
use sqlx::PgPool;
use tracing::{error, info};

/// PostgreSQL-backed durable post store
#[derive(Clone)]
pub struct PgPostRepository {
    pool: PgPool,
}

impl PgPostRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl PostStore for PgPostRepository {
    /// Find a post by ID
    async fn get(&self, id: i32) -> StoreResult<Post> {
        sqlx::query_as::<_, Post>(
            r#"
            SELECT id, title, description, short_text, full_text, uri
            FROM posts
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(StoreError::NotFound(id))
    }

    /// All posts, oldest first
    async fn list(&self) -> StoreResult<Vec<Post>> {
        let posts = sqlx::query_as::<_, Post>(
            r#"
            SELECT id, title, description, short_text, full_text, uri
            FROM posts
            ORDER BY id
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(posts)
    }

    async fn create(&self, post: &Post) -> StoreResult<Post> {
        let result = sqlx::query_as::<_, Post>(
            r#"
            INSERT INTO posts (title, description, short_text, full_text, uri)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, title, description, short_text, full_text, uri
            "#,
        )
        .bind(&post.title)
        .bind(&post.description)
        .bind(&post.short_text)
        .bind(&post.full_text)
        .bind(&post.uri)
        .fetch_one(&self.pool)
        .await;

        match result {
            Ok(created) => {
                info!(post_id = created.id, "Created post");
                Ok(created)
            }
            Err(e) => {
                error!(error = %e, "Error during post creation");
                Err(e.into())
            }
        }
    }

    /// Overwrite every text field; zero affected rows is NotFound
    async fn update(&self, post: &Post) -> StoreResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE posts
            SET title = $1, description = $2, short_text = $3, full_text = $4, uri = $5
            WHERE id = $6
            "#,
        )
        .bind(&post.title)
        .bind(&post.description)
        .bind(&post.short_text)
        .bind(&post.full_text)
        .bind(&post.uri)
        .bind(post.id)
        .execute(&self.pool)
        .await;

        match result {
            Ok(done) if done.rows_affected() == 0 => Err(StoreError::NotFound(post.id)),
            Ok(_) => {
                info!(post_id = post.id, "Updated post");
                Ok(())
            }
            Err(e) => {
                error!(post_id = post.id, error = %e, "Error during post update");
                Err(e.into())
            }
        }
    }

    async fn delete(&self, id: i32) -> StoreResult<()> {
        let result = sqlx::query("DELETE FROM posts WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await;

        match result {
            Ok(done) if done.rows_affected() == 0 => Err(StoreError::NotFound(id)),
            Ok(_) => {
                info!(post_id = id, "Deleted post");
                Ok(())
            }
            Err(e) => {
                error!(post_id = id, error = %e, "Error during post deletion");
                Err(e.into())
            }
        }
    }

    async fn ping(&self) -> StoreResult<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}
