/// Post data model
///
/// `Post` is both the durable row and the cached payload. The read counter is
/// not part of it: it lives in the counter store and is resolved per request.
use serde::{Deserialize, Serialize};

/// Post row
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Post {
    /// Store-assigned identity, `0` until created
    pub id: i32,
    pub title: String,
    pub description: String,
    pub short_text: String,
    pub full_text: String,
    pub uri: String,
}

impl Post {
    /// Unsaved post built from input fields
    pub fn from_input(input: PostInput) -> Self {
        Self::with_id(0, input)
    }

    pub fn with_id(id: i32, input: PostInput) -> Self {
        Self {
            id,
            title: input.title,
            description: input.description,
            short_text: input.short_text,
            full_text: input.full_text,
            uri: input.uri,
        }
    }

    pub fn is_persisted(&self) -> bool {
        self.id != 0
    }
}

/// Writable post fields
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, async_graphql::InputObject)]
#[graphql(name = "PostInput")]
pub struct PostInput {
    #[graphql(default)]
    pub title: String,
    #[graphql(default)]
    pub description: String,
    #[graphql(default)]
    pub short_text: String,
    #[graphql(default)]
    pub full_text: String,
    #[graphql(default)]
    pub uri: String,
}
