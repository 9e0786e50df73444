//! Post queries, mutations and the `Post` output type

use async_graphql::{Context, ErrorExtensions, Object, Result as GraphQLResult, ID};
use std::sync::Arc;

use crate::error::AppError;
use crate::models::{Post, PostInput};
use crate::services::{PostService, ReadCounter};

/// GraphQL view of a post. `readCount` is resolved live on every access.
pub struct PostNode(pub Post);

impl From<Post> for PostNode {
    fn from(post: Post) -> Self {
        PostNode(post)
    }
}

#[Object(name = "Post")]
impl PostNode {
    async fn id(&self) -> ID {
        ID::from(self.0.id.to_string())
    }

    async fn title(&self) -> &str {
        &self.0.title
    }

    async fn description(&self) -> &str {
        &self.0.description
    }

    async fn short_text(&self) -> &str {
        &self.0.short_text
    }

    async fn full_text(&self) -> &str {
        &self.0.full_text
    }

    async fn uri(&self) -> &str {
        &self.0.uri
    }

    /// Number of times this field was read for the post, this read included
    async fn read_count(&self, ctx: &Context<'_>) -> GraphQLResult<i64> {
        let counter = ctx
            .data::<ReadCounter>()
            .map_err(|_| AppError::Internal("read counter not configured".into()).extend())?;
        counter.bump(self.0.id).await.map_err(|e| e.extend())
    }
}

fn service<'a>(ctx: &Context<'a>) -> GraphQLResult<&'a Arc<PostService>> {
    ctx.data::<Arc<PostService>>()
        .map_err(|_| AppError::Internal("post service not configured".into()).extend())
}

#[derive(Default)]
pub struct PostQuery;

#[Object]
impl PostQuery {
    async fn get_post(&self, ctx: &Context<'_>, id: i32) -> GraphQLResult<Option<PostNode>> {
        let post = service(ctx)?.get_post(id).await.map_err(|e| e.extend())?;
        Ok(Some(post.into()))
    }

    async fn get_posts(&self, ctx: &Context<'_>) -> GraphQLResult<Vec<PostNode>> {
        let posts = service(ctx)?.list_posts().await.map_err(|e| e.extend())?;
        Ok(posts.into_iter().map(PostNode::from).collect())
    }
}

#[derive(Default)]
pub struct PostMutation;

#[Object]
impl PostMutation {
    async fn create_post(&self, ctx: &Context<'_>, post: PostInput) -> GraphQLResult<ID> {
        let id = service(ctx)?
            .create_post(post)
            .await
            .map_err(|e| e.extend())?;
        Ok(ID::from(id.to_string()))
    }

    async fn update_post(
        &self,
        ctx: &Context<'_>,
        id: i32,
        post: PostInput,
    ) -> GraphQLResult<PostNode> {
        let updated = service(ctx)?
            .update_post(id, post)
            .await
            .map_err(|e| e.extend())?;
        Ok(updated.into())
    }

    async fn delete_post(&self, ctx: &Context<'_>, id: i32) -> GraphQLResult<bool> {
        service(ctx)?.delete_post(id).await.map_err(|e| e.extend())
    }
}
