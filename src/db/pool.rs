//! Credential store connection and schema bootstrap.

use sqlx::postgres::{PgConnectOptions, PgPoolOptions};
use std::time::Duration;
use tracing::info;

pub type DbPool = sqlx::PgPool;

const USERS_DDL: &str = include_str!("../../migrations/0001_create_users.sql");

/// Connect to PostgreSQL. A handful of connections is plenty for form posts.
pub async fn create_pool(options: PgConnectOptions) -> Result<DbPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(5)
        .acquire_timeout(Duration::from_secs(5))
        .connect_with(options)
        .await
}

/// Create the `users` table if it does not exist yet.
pub async fn ensure_schema(pool: &DbPool) -> Result<(), sqlx::Error> {
    sqlx::query(USERS_DDL).execute(pool).await?;
    info!("users table ready");
    Ok(())
}
