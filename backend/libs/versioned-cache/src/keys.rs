//! Cache key schema
//!
//! Every key is derived from `(namespace, scope entity, scope key)`:
//! - envelope:       `{ns}:{entity}:{key}`
//! - change counter: `{ns}:last-change:{entity}:{key}`
//! - read counter:   `{ns}:ctr:{entity}:{key}`
//!
//! Collection scopes use an empty key, so their keys end with a trailing `:`.

use std::fmt;

/// Default key namespace
pub const DEFAULT_NAMESPACE: &str = "microblog";

const CHANGE_SEGMENT: &str = "last-change";
const READ_COUNTER_SEGMENT: &str = "ctr";

/// Invalidation scope: one entity by id, or a whole collection.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Scope {
    entity: String,
    key: String,
}

impl Scope {
    /// Single-entity scope, e.g. `("post-key", "7")`
    pub fn entity(kind: &str, id: impl fmt::Display) -> Self {
        Self {
            entity: kind.to_string(),
            key: id.to_string(),
        }
    }

    /// Collection scope, e.g. `("post-list", "")`
    pub fn collection(kind: &str) -> Self {
        Self {
            entity: kind.to_string(),
            key: String::new(),
        }
    }

    pub fn kind(&self) -> &str {
        &self.entity
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn is_collection(&self) -> bool {
        self.key.is_empty()
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.entity, self.key)
    }
}

/// Key builder bound to a namespace
#[derive(Debug, Clone)]
pub struct KeySchema {
    namespace: String,
}

impl Default for KeySchema {
    fn default() -> Self {
        Self::new(DEFAULT_NAMESPACE)
    }
}

impl KeySchema {
    pub fn new(namespace: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
        }
    }

    /// Envelope key
    /// Format: microblog:post-key:7
    pub fn envelope(&self, scope: &Scope) -> String {
        format!("{}:{}:{}", self.namespace, scope.entity, scope.key)
    }

    /// Change counter key
    /// Format: microblog:last-change:post-key:7
    pub fn change_counter(&self, scope: &Scope) -> String {
        format!(
            "{}:{}:{}:{}",
            self.namespace, CHANGE_SEGMENT, scope.entity, scope.key
        )
    }

    /// Read counter key
    /// Format: microblog:ctr:post-key:7
    pub fn read_counter(&self, scope: &Scope) -> String {
        format!(
            "{}:{}:{}:{}",
            self.namespace, READ_COUNTER_SEGMENT, scope.entity, scope.key
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entity_keys() {
        let keys = KeySchema::default();
        let scope = Scope::entity("post-key", 7);
        assert_eq!(keys.envelope(&scope), "microblog:post-key:7");
        assert_eq!(
            keys.change_counter(&scope),
            "microblog:last-change:post-key:7"
        );
        assert_eq!(keys.read_counter(&scope), "microblog:ctr:post-key:7");
    }

    #[test]
    fn test_collection_keys() {
        let keys = KeySchema::new("blog");
        let scope = Scope::collection("post-list");
        assert!(scope.is_collection());
        assert_eq!(keys.envelope(&scope), "blog:post-list:");
        assert_eq!(keys.change_counter(&scope), "blog:last-change:post-list:");
    }

    #[test]
    fn test_scopes_do_not_collide() {
        let keys = KeySchema::default();
        let a = Scope::entity("post-key", 1);
        let b = Scope::entity("post-key", 11);
        assert_ne!(keys.change_counter(&a), keys.change_counter(&b));
        assert_ne!(keys.envelope(&a), keys.change_counter(&a));
    }
}
