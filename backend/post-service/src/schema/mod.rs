//! GraphQL schema

pub mod post;

use async_graphql::{EmptySubscription, MergedObject, Schema};
use std::sync::Arc;

use crate::services::{PostService, ReadCounter};

pub use post::PostNode;

/// Root query object
#[derive(MergedObject, Default)]
pub struct QueryRoot(post::PostQuery);

/// Root mutation object
#[derive(MergedObject, Default)]
pub struct MutationRoot(post::PostMutation);

pub type AppSchema = Schema<QueryRoot, MutationRoot, EmptySubscription>;

pub fn build_schema(service: Arc<PostService>, read_counter: ReadCounter) -> AppSchema {
    Schema::build(
        QueryRoot::default(),
        MutationRoot::default(),
        EmptySubscription,
    )
    .data(service)
    .data(read_counter)
    .finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{PostStore, StoreError, StoreResult};
    use crate::models::Post;
    use versioned_cache::{MemoryVersionStore, RetryConfig, VersionedCache};

    struct EmptyStore;

    #[async_trait::async_trait]
    impl PostStore for EmptyStore {
        async fn get(&self, id: i32) -> StoreResult<Post> {
            Err(StoreError::NotFound(id))
        }
        async fn list(&self) -> StoreResult<Vec<Post>> {
            Ok(Vec::new())
        }
        async fn create(&self, _post: &Post) -> StoreResult<Post> {
            Err(StoreError::Unavailable("read-only".into()))
        }
        async fn update(&self, post: &Post) -> StoreResult<()> {
            Err(StoreError::NotFound(post.id))
        }
        async fn delete(&self, id: i32) -> StoreResult<()> {
            Err(StoreError::NotFound(id))
        }
        async fn ping(&self) -> StoreResult<()> {
            Ok(())
        }
    }

    fn schema() -> AppSchema {
        let versions = Arc::new(MemoryVersionStore::default());
        let service = PostService::new(
            Arc::new(EmptyStore),
            VersionedCache::new(versions.clone()),
            RetryConfig::none(),
        );
        build_schema(Arc::new(service), ReadCounter::new(versions))
    }

    #[test]
    fn test_schema_sdl() {
        let sdl = schema().sdl();
        assert!(sdl.contains("type Query"));
        assert!(sdl.contains("getPost(id: Int!): Post"));
        assert!(sdl.contains("createPost(post: PostInput!): ID!"));
        assert!(sdl.contains("readCount: Int!"));
        assert!(sdl.contains("shortText: String!"));
    }

    #[tokio::test]
    async fn test_missing_post_carries_not_found_code() {
        let response = schema().execute("{ getPost(id: 9) { id } }").await;
        assert_eq!(response.errors.len(), 1);
        let extensions = serde_json::to_value(&response.errors[0].extensions).unwrap();
        assert_eq!(extensions["code"], "NOT_FOUND");
    }

    #[tokio::test]
    async fn test_unwired_schema_reports_internal() {
        let bare = Schema::build(
            QueryRoot::default(),
            MutationRoot::default(),
            EmptySubscription,
        )
        .finish();
        let response = bare.execute("{ getPosts { id } }").await;
        assert_eq!(response.errors.len(), 1);
        let extensions = serde_json::to_value(&response.errors[0].extensions).unwrap();
        assert_eq!(extensions["code"], "INTERNAL");
    }

    #[tokio::test]
    async fn test_empty_list() {
        let response = schema().execute("{ getPosts { id title } }").await;
        assert!(response.errors.is_empty());
        let data = response.data.into_json().unwrap();
        assert_eq!(data, serde_json::json!({ "getPosts": [] }));
    }
}
