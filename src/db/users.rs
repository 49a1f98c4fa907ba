//! User queries.

use crate::error::{AppError, AppResult};
use crate::models::User;
use chrono::{DateTime, Utc};
use sqlx::FromRow;
use uuid::Uuid;

use super::DbPool;

#[derive(Debug, FromRow)]
pub struct UserRow {
    pub id: Uuid,
    pub username: String,
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
}

impl From<UserRow> for User {
    fn from(row: UserRow) -> Self {
        Self {
            id: row.id,
            username: row.username,
            password_hash: row.password_hash,
            created_at: row.created_at,
        }
    }
}

/// Insert a user. A unique-key violation becomes `DuplicateUser`, which
/// covers two registrations racing past the existence check.
pub async fn user_create(
    pool: &DbPool,
    username: &str,
    password_hash: &str,
) -> AppResult<UserRow> {
    sqlx::query_as::<_, UserRow>(
        r#"
        INSERT INTO users (username, password_hash)
        VALUES ($1, $2)
        RETURNING id, username, password_hash, created_at
        "#,
    )
    .bind(username)
    .bind(password_hash)
    .fetch_one(pool)
    .await
    .map_err(|e| match &e {
        sqlx::Error::Database(db) if db.is_unique_violation() => {
            AppError::DuplicateUser(username.to_string())
        }
        _ => AppError::Db(e),
    })
}

/// All users with this username. At most one while the unique key holds.
pub async fn users_find_by_username(pool: &DbPool, username: &str) -> AppResult<Vec<UserRow>> {
    let rows = sqlx::query_as::<_, UserRow>(
        "SELECT id, username, password_hash, created_at FROM users WHERE username = $1 LIMIT 2",
    )
    .bind(username)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}
