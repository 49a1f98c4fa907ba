//! Storage seams: the credential store and the session store.
//!
//! Production runs on PostgreSQL (users) and Redis (sessions); the in-memory
//! implementations back tests and database-less local runs.

use async_trait::async_trait;
use std::time::Duration;

use crate::error::AppResult;
use crate::models::{SessionRecord, User};

pub mod memory;
pub mod postgres;
pub mod redis_repo;

pub use memory::{MemorySessionRepository, MemoryUserRepository};
pub use postgres::PgUserRepository;
pub use redis_repo::RedisSessionRepository;

/// Credential store: one record per user, unique by username.
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Every user stored under `username`.
    async fn find_by_username(&self, username: &str) -> AppResult<Vec<User>>;

    /// Insert a user; fails with `DuplicateUser` if the username is taken.
    async fn insert(&self, username: &str, password_hash: &str) -> AppResult<User>;
}

/// Session store keyed by an opaque key, with per-record expiry.
#[async_trait]
pub trait SessionRepository: Send + Sync {
    async fn load(&self, key: &str) -> AppResult<Option<SessionRecord>>;

    /// Write the record; the store may drop it once `ttl` has elapsed.
    async fn save(&self, key: &str, record: &SessionRecord, ttl: Duration) -> AppResult<()>;

    /// Remove the record. Removing a missing key is not an error.
    async fn delete(&self, key: &str) -> AppResult<()>;
}
