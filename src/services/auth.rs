//! Registration and login against the credential store.

use std::sync::Arc;
use tracing::{debug, info, instrument};
use validator::Validate;

use crate::auth::PasswordHasher;
use crate::error::{AppError, AppResult};
use crate::models::{generate_session_id, LoginForm, RegisterForm, SessionRecord, User};
use crate::repositories::UserRepository;
use crate::services::SessionService;

#[derive(Clone)]
pub struct AuthService {
    users: Arc<dyn UserRepository>,
    hasher: PasswordHasher,
    sessions: SessionService,
    /// Hash checked when no single user matches, so a login for an unknown
    /// username costs the same as a wrong password.
    stand_in_hash: Arc<str>,
}

impl AuthService {
    pub fn new(
        users: Arc<dyn UserRepository>,
        hasher: PasswordHasher,
        sessions: SessionService,
    ) -> AppResult<Self> {
        let stand_in_hash = hasher.hash(&generate_session_id())?.into();
        Ok(Self {
            users,
            hasher,
            sessions,
            stand_in_hash,
        })
    }

    /// Validate the form, refuse taken usernames, then store a salted hash.
    #[instrument(skip_all, fields(username = %form.username))]
    pub async fn register(&self, form: RegisterForm) -> AppResult<User> {
        form.validate().map_err(|e| AppError::Validation(e.to_string()))?;

        if !self.users.find_by_username(&form.username).await?.is_empty() {
            debug!("username already taken");
            return Err(AppError::DuplicateUser(form.username));
        }

        let hash = self.hash(form.password).await?;
        let user = self.users.insert(&form.username, &hash).await?;
        info!(user_id = %user.id, "user registered");
        Ok(user)
    }

    /// Check credentials and issue an authenticated session in place of
    /// `previous`. Unknown user and wrong password fail the same way.
    #[instrument(skip_all, fields(username = %form.username))]
    pub async fn login(
        &self,
        form: LoginForm,
        previous: Option<SessionRecord>,
    ) -> AppResult<SessionRecord> {
        form.validate().map_err(|e| AppError::Validation(e.to_string()))?;

        let mut matches = self.users.find_by_username(&form.username).await?;
        if matches.len() != 1 {
            self.verify(form.password, self.stand_in_hash.to_string()).await?;
            debug!(matches = matches.len(), "login rejected: no unique user");
            return Err(AppError::Authentication);
        }
        let user = matches.remove(0);

        if !self.verify(form.password, user.password_hash).await? {
            debug!("login rejected: password mismatch");
            return Err(AppError::Authentication);
        }

        let session = self.sessions.establish(previous, &user.username).await?;
        info!("user logged in");
        Ok(session)
    }

    /// Destroy the session a cookie value points at. The record is deleted
    /// without being read, so an unreadable record cannot block logout.
    pub async fn logout(&self, token: Option<&str>) -> AppResult<()> {
        if self.sessions.destroy_token(token).await? {
            info!("logged out");
        }
        Ok(())
    }

    // Hashing is CPU-bound; keep it off the async workers.
    async fn hash(&self, password: String) -> AppResult<String> {
        let hasher = self.hasher.clone();
        tokio::task::spawn_blocking(move || hasher.hash(&password))
            .await
            .map_err(|e| AppError::Internal(anyhow::anyhow!("hash task: {}", e)))?
    }

    async fn verify(&self, password: String, hash: String) -> AppResult<bool> {
        let hasher = self.hasher.clone();
        tokio::task::spawn_blocking(move || hasher.verify(&password, &hash))
            .await
            .map_err(|e| AppError::Internal(anyhow::anyhow!("verify task: {}", e)))?
    }
}
