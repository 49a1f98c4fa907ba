//! Session lifecycle: resolve the signed cookie, count hits, issue and destroy sessions.

use axum_extra::extract::cookie::{Cookie, SameSite};
use chrono::{DateTime, Duration, Utc};
use std::sync::Arc;
use tracing::{debug, instrument, warn};

use crate::auth::TokenSigner;
use crate::config::Config;
use crate::error::{AppError, AppResult};
use crate::models::SessionRecord;
use crate::repositories::SessionRepository;

/// Cookie and lifetime settings for sessions.
#[derive(Clone, Debug)]
pub struct SessionSettings {
    pub cookie_name: String,
    pub cookie_secure: bool,
    pub signing_secret: String,
    pub store_secret: String,
    pub ttl: Duration,
    pub anonymous_ttl: Duration,
}

impl SessionSettings {
    pub fn from_config(config: &Config) -> AppResult<Self> {
        let to_chrono = |d: std::time::Duration| {
            Duration::from_std(d).map_err(|e| AppError::Config(format!("session ttl: {}", e)))
        };
        Ok(Self {
            cookie_name: config.session_cookie_name.clone(),
            cookie_secure: config.cookie_secure,
            signing_secret: config.session_secret.clone(),
            store_secret: config.session_store_secret.clone(),
            ttl: to_chrono(config.session_ttl)?,
            anonymous_ttl: to_chrono(config.anonymous_session_ttl)?,
        })
    }
}

#[derive(Clone)]
pub struct SessionService {
    repo: Arc<dyn SessionRepository>,
    cookie_signer: TokenSigner,
    store_keys: TokenSigner,
    settings: Arc<SessionSettings>,
}

impl SessionService {
    pub fn new(repo: Arc<dyn SessionRepository>, settings: SessionSettings) -> Self {
        Self {
            repo,
            cookie_signer: TokenSigner::new(&settings.signing_secret),
            store_keys: TokenSigner::new(&settings.store_secret),
            settings: Arc::new(settings),
        }
    }

    pub fn cookie_name(&self) -> &str {
        &self.settings.cookie_name
    }

    pub fn ttl(&self) -> Duration {
        self.settings.ttl
    }

    /// Store key for a session id. The store never sees the id itself.
    fn store_key(&self, id: &str) -> String {
        self.store_keys.digest(id)
    }

    /// Resolve a cookie value to a live session.
    pub async fn load(&self, token: Option<&str>) -> AppResult<Option<SessionRecord>> {
        self.load_at(token, Utc::now()).await
    }

    /// Resolve a cookie value to a session live at `now`. Bad signatures,
    /// unknown ids and expired records all resolve to `None`.
    pub async fn load_at(
        &self,
        token: Option<&str>,
        now: DateTime<Utc>,
    ) -> AppResult<Option<SessionRecord>> {
        let Some(token) = token else {
            return Ok(None);
        };
        let Some(id) = self.cookie_signer.verify(token) else {
            debug!("session cookie failed signature check");
            return Ok(None);
        };
        let key = self.store_key(id);
        let loaded = match self.repo.load(&key).await {
            Ok(loaded) => loaded,
            Err(AppError::Serialization(e)) => {
                warn!(error = %e, "unreadable session record dropped");
                self.repo.delete(&key).await?;
                return Ok(None);
            }
            Err(e) => return Err(e),
        };
        let Some(mut record) = loaded else {
            return Ok(None);
        };
        if !record.is_live_at(now) {
            debug!("session expired");
            self.repo.delete(&key).await?;
            return Ok(None);
        }
        record.id = id.to_string();
        Ok(Some(record))
    }

    async fn save_at(&self, record: &SessionRecord, now: DateTime<Utc>) -> AppResult<()> {
        let Some(ttl) = record.remaining_at(now) else {
            return Ok(());
        };
        self.repo.save(&self.store_key(&record.id), record, ttl).await
    }

    /// Count a visit to the current session, starting an anonymous one if needed.
    #[instrument(skip_all)]
    pub async fn record_hit(&self, current: Option<SessionRecord>) -> AppResult<SessionRecord> {
        let now = Utc::now();
        let mut record = match current {
            Some(record) if record.is_live_at(now) => record,
            _ => SessionRecord::anonymous(now, self.settings.anonymous_ttl),
        };
        let hits = record.record_hit();
        self.save_at(&record, now).await?;
        debug!(hits, "page hit recorded");
        Ok(record)
    }

    /// Replace the current session with an authenticated one for `username`.
    pub async fn establish(
        &self,
        previous: Option<SessionRecord>,
        username: &str,
    ) -> AppResult<SessionRecord> {
        self.establish_at(previous, username, Utc::now()).await
    }

    pub async fn establish_at(
        &self,
        previous: Option<SessionRecord>,
        username: &str,
        now: DateTime<Utc>,
    ) -> AppResult<SessionRecord> {
        let record =
            SessionRecord::authenticated(username, previous.as_ref(), now, self.settings.ttl);
        if let Some(previous) = previous {
            self.destroy(&previous).await?;
        }
        self.save_at(&record, now).await?;
        Ok(record)
    }

    /// Delete a session record. Deleting an absent record is a no-op.
    pub async fn destroy(&self, record: &SessionRecord) -> AppResult<()> {
        self.repo.delete(&self.store_key(&record.id)).await
    }

    /// Delete whatever record a cookie value points at, without reading it.
    /// Unsigned or forged values delete nothing.
    pub async fn destroy_token(&self, token: Option<&str>) -> AppResult<bool> {
        let Some(id) = token.and_then(|t| self.cookie_signer.verify(t)) else {
            return Ok(false);
        };
        self.repo.delete(&self.store_key(id)).await?;
        Ok(true)
    }

    /// Cookie carrying the signed id. Authenticated sessions get a Max-Age
    /// matching their remaining lifetime; anonymous ones are browser-session cookies.
    pub fn cookie(&self, record: &SessionRecord) -> Cookie<'static> {
        let mut builder = Cookie::build((
            self.settings.cookie_name.clone(),
            self.cookie_signer.sign(&record.id),
        ))
        .path("/")
        .http_only(true)
        .secure(self.settings.cookie_secure)
        .same_site(SameSite::Lax);
        if record.is_authenticated() {
            let remaining = record.expires_at - Utc::now();
            builder = builder.max_age(time::Duration::milliseconds(
                remaining.num_milliseconds().max(0),
            ));
        }
        builder.build()
    }

    /// Cookie to hand to `CookieJar::remove` on logout.
    pub fn removal_cookie(&self) -> Cookie<'static> {
        Cookie::build((self.settings.cookie_name.clone(), ""))
            .path("/")
            .build()
    }
}
