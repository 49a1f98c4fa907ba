//! Redis session store: one JSON string per session, expired by Redis via `PX`.

use async_trait::async_trait;
use redis::{aio::ConnectionManager, AsyncCommands};
use std::time::Duration;
use tracing::debug;

use super::SessionRepository;
use crate::error::AppError;
use crate::models::SessionRecord;

const SESSION_PREFIX: &str = "notes:session:";

fn session_key(key: &str) -> String {
    format!("{}{}", SESSION_PREFIX, key)
}

/// Redis-backed session repository.
///
/// Holds one multiplexed connection that reconnects on failure; clones share it.
#[derive(Clone)]
pub struct RedisSessionRepository {
    manager: ConnectionManager,
}

impl RedisSessionRepository {
    /// Connect to Redis. Fails if the server cannot be reached.
    pub async fn connect(redis_url: &str) -> Result<Self, AppError> {
        let client = redis::Client::open(redis_url)?;
        let manager = ConnectionManager::new(client).await?;
        Ok(Self { manager })
    }

    fn connection(&self) -> ConnectionManager {
        self.manager.clone()
    }

    /// Round-trip a PING; used at startup to fail fast.
    pub async fn ping(&self) -> Result<(), AppError> {
        let mut conn = self.connection();
        redis::cmd("PING").query_async::<_, ()>(&mut conn).await?;
        Ok(())
    }
}

#[async_trait]
impl SessionRepository for RedisSessionRepository {
    async fn load(&self, key: &str) -> Result<Option<SessionRecord>, AppError> {
        let mut conn = self.connection();
        let raw: Option<String> = conn.get(session_key(key)).await?;
        match raw {
            Some(data) => Ok(Some(serde_json::from_str(&data)?)),
            None => Ok(None),
        }
    }

    async fn save(
        &self,
        key: &str,
        record: &SessionRecord,
        ttl: Duration,
    ) -> Result<(), AppError> {
        // PX 0 is rejected by Redis
        let ttl_ms = ttl.as_millis().max(1) as u64;
        let data = serde_json::to_string(record)?;
        let mut conn = self.connection();
        redis::cmd("SET")
            .arg(session_key(key))
            .arg(data)
            .arg("PX")
            .arg(ttl_ms)
            .query_async::<_, ()>(&mut conn)
            .await?;
        debug!(ttl_ms, "session saved");
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), AppError> {
        let mut conn = self.connection();
        conn.del::<_, ()>(session_key(key)).await?;
        Ok(())
    }
}
