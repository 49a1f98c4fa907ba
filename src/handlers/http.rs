//! Shared application state and the health check.

use axum::{http::StatusCode, Json};
use serde_json::json;
use std::sync::Arc;

use crate::auth::PasswordHasher;
use crate::config::Config;
use crate::error::AppResult;
use crate::repositories::{SessionRepository, UserRepository};
use crate::services::{AuthService, SessionService, SessionSettings};

/// Shared application state, cloned into every handler.
#[derive(Clone)]
pub struct AppState {
    pub auth_service: AuthService,
    pub session_service: SessionService,
}

impl AppState {
    /// Wire services over the given stores.
    pub fn new(
        users: Arc<dyn UserRepository>,
        sessions: Arc<dyn SessionRepository>,
        config: &Config,
    ) -> AppResult<Self> {
        let session_service = SessionService::new(sessions, SessionSettings::from_config(config)?);
        let hasher = PasswordHasher::new(config.hash_rounds)?;
        let auth_service = AuthService::new(users, hasher, session_service.clone())?;
        Ok(Self {
            auth_service,
            session_service,
        })
    }

    pub fn auth_service(&self) -> &AuthService {
        &self.auth_service
    }
    pub fn session_service(&self) -> &SessionService {
        &self.session_service
    }
}

/// GET /health: liveness check.
pub async fn health() -> (StatusCode, Json<serde_json::Value>) {
    (
        StatusCode::OK,
        Json(json!({ "status": "ok", "service": "notes-auth" })),
    )
}
