/// Post Service Library
///
/// Serves posts over GraphQL from a PostgreSQL table, fronted by a versioned
/// read-through / write-invalidate Redis cache.
///
/// # Modules
///
/// - `config`: Configuration management
/// - `db`: Durable post store and connection pooling
/// - `error`: Error types and handling
/// - `models`: Post data structures
/// - `schema`: GraphQL queries and mutations
/// - `services`: Cache-consistent post operations and the read counter
pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod schema;
pub mod services;

pub use config::Config;
pub use error::{AppError, Result};
