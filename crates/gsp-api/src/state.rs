//! # Application State
//!
//! Shared state for all route handlers: the Postgres pool and the keyed
//! query cache. Cloning is cheap; both members are handle types.

use sqlx::PgPool;

use crate::cache::QueryCache;

/// Shared application state injected into every handler.
#[derive(Clone)]
pub struct AppState {
    /// Postgres connection pool.
    pub db: PgPool,
    /// List-query cache with keyed invalidation.
    pub cache: QueryCache,
}

impl AppState {
    pub fn new(db: PgPool) -> Self {
        Self {
            db,
            cache: QueryCache::with_default_ttl(),
        }
    }
}
