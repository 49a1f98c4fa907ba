//! Session extractors: the current session, and the gate for logged-in pages.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum_extra::extract::CookieJar;
use chrono::Utc;
use tracing::debug;

use crate::error::AppError;
use crate::handlers::http::AppState;
use crate::models::SessionRecord;

async fn resolve(parts: &Parts, state: &AppState) -> Result<Option<SessionRecord>, AppError> {
    let sessions = state.session_service();
    let jar = CookieJar::from_headers(&parts.headers);
    let token = jar.get(sessions.cookie_name()).map(|c| c.value());
    sessions.load(token).await
}

/// Extractor: the live session bound to the request cookie, if any.
#[derive(Clone, Debug)]
pub struct CurrentSession(pub Option<SessionRecord>);

#[axum::async_trait]
impl FromRequestParts<AppState> for CurrentSession {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        Ok(CurrentSession(resolve(parts, state).await?))
    }
}

/// Extractor: a live, authenticated session. Anything else rejects with
/// `SessionExpired`, which responds with a redirect to `/login`.
#[derive(Clone, Debug)]
pub struct AuthenticatedUser {
    pub username: String,
    pub session: SessionRecord,
}

#[axum::async_trait]
impl FromRequestParts<AppState> for AuthenticatedUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let session = resolve(parts, state).await?.ok_or_else(|| {
            debug!(path = %parts.uri.path(), "no session for gated page");
            AppError::SessionExpired
        })?;
        let username = session
            .authenticated_user_at(Utc::now())
            .map(str::to_string)
            .ok_or_else(|| {
                debug!(path = %parts.uri.path(), "anonymous session on gated page");
                AppError::SessionExpired
            })?;
        Ok(AuthenticatedUser { username, session })
    }
}
