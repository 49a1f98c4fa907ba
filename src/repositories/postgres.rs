//! PostgreSQL credential store.

use async_trait::async_trait;
use tracing::debug;

use super::UserRepository;
use crate::db::{self, DbPool};
use crate::error::AppResult;
use crate::models::User;

#[derive(Clone)]
pub struct PgUserRepository {
    pool: DbPool,
}

impl PgUserRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserRepository for PgUserRepository {
    async fn find_by_username(&self, username: &str) -> AppResult<Vec<User>> {
        let rows = db::users_find_by_username(&self.pool, username).await?;
        debug!(matches = rows.len(), "user lookup");
        Ok(rows.into_iter().map(User::from).collect())
    }

    async fn insert(&self, username: &str, password_hash: &str) -> AppResult<User> {
        let row = db::user_create(&self.pool, username, password_hash).await?;
        Ok(row.into())
    }
}
