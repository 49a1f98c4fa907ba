//! In-memory stores for tests and database-less runs.

use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{SessionRepository, UserRepository};
use crate::error::{AppError, AppResult};
use crate::models::{SessionRecord, User};

/// Users keyed by username; the map key enforces uniqueness.
#[derive(Clone, Default)]
pub struct MemoryUserRepository {
    users: Arc<RwLock<HashMap<String, User>>>,
}

impl MemoryUserRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.users.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.users.read().await.is_empty()
    }
}

#[async_trait]
impl UserRepository for MemoryUserRepository {
    async fn find_by_username(&self, username: &str) -> AppResult<Vec<User>> {
        let users = self.users.read().await;
        Ok(users.get(username).cloned().into_iter().collect())
    }

    async fn insert(&self, username: &str, password_hash: &str) -> AppResult<User> {
        let mut users = self.users.write().await;
        if users.contains_key(username) {
            return Err(AppError::DuplicateUser(username.to_string()));
        }
        let user = User {
            id: Uuid::new_v4(),
            username: username.to_string(),
            password_hash: password_hash.to_string(),
            created_at: Utc::now(),
        };
        users.insert(username.to_string(), user.clone());
        Ok(user)
    }
}

/// Sessions keyed by store key. Records past `expires_at` are dropped on read.
#[derive(Clone, Default)]
pub struct MemorySessionRepository {
    sessions: Arc<RwLock<HashMap<String, SessionRecord>>>,
}

impl MemorySessionRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored records, live or not.
    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.sessions.read().await.is_empty()
    }
}

#[async_trait]
impl SessionRepository for MemorySessionRepository {
    async fn load(&self, key: &str) -> AppResult<Option<SessionRecord>> {
        let mut sessions = self.sessions.write().await;
        let live = match sessions.get(key) {
            Some(record) => record.is_live_at(Utc::now()),
            None => return Ok(None),
        };
        if live {
            Ok(sessions.get(key).cloned())
        } else {
            sessions.remove(key);
            Ok(None)
        }
    }

    async fn save(&self, key: &str, record: &SessionRecord, _ttl: Duration) -> AppResult<()> {
        self.sessions
            .write()
            .await
            .insert(key.to_string(), record.clone());
        Ok(())
    }

    async fn delete(&self, key: &str) -> AppResult<()> {
        self.sessions.write().await.remove(key);
        Ok(())
    }
}
