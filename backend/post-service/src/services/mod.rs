/// Business logic layer
///
/// - `PostService`: cache-consistent post reads and writes
/// - `ReadCounter`: per-post access counter
pub mod posts;
pub mod read_counter;

pub use posts::PostService;
pub use read_counter::ReadCounter;

use versioned_cache::Scope;

/// Scope kind for single posts
pub const POST_SCOPE: &str = "post-key";
/// Scope kind for the post collection
pub const POST_LIST_SCOPE: &str = "post-list";

pub fn post_scope(post_id: i32) -> Scope {
    Scope::entity(POST_SCOPE, post_id)
}

pub fn post_list_scope() -> Scope {
    Scope::collection(POST_LIST_SCOPE)
}
