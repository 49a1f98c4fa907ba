//! Auth HTTP handlers: registration, login, the gated page, logout.
//!
//! Domain failures never reach the browser as error statuses; they become
//! redirects back to the relevant form.

use axum::{
    extract::{Query, State},
    response::{Html, IntoResponse, Redirect, Response},
    Form,
};
use axum_extra::extract::CookieJar;
use serde::Deserialize;

use crate::error::AppError;
use crate::handlers::html::{credentials_form, escape};
use crate::handlers::http::AppState;
use crate::middleware::{AuthenticatedUser, CurrentSession};
use crate::models::{LoginForm, RegisterForm};

#[derive(Debug, Deserialize)]
pub struct FormNotice {
    pub error: Option<String>,
}

/// GET /createUser
pub async fn create_user_form(Query(notice): Query<FormNotice>) -> Html<String> {
    let mut html = credentials_form("create user", "/submitUser");
    match notice.error.as_deref() {
        Some("invalid") => html.push_str(
            "<br>Username must be 1-20 letters or digits; password must be 1-20 characters",
        ),
        Some("taken") => html.push_str("<br>That username is already taken"),
        _ => {}
    }
    Html(html)
}

/// POST /submitUser
pub async fn submit_user(
    State(state): State<AppState>,
    Form(form): Form<RegisterForm>,
) -> Result<Response, AppError> {
    match state.auth_service().register(form).await {
        Ok(_) => Ok(Html("successfully created user").into_response()),
        Err(AppError::Validation(_)) => {
            Ok(Redirect::to("/createUser?error=invalid").into_response())
        }
        Err(AppError::DuplicateUser(_)) => {
            Ok(Redirect::to("/createUser?error=taken").into_response())
        }
        Err(e) => Err(e),
    }
}

/// GET /login
pub async fn login_form() -> Html<String> {
    Html(credentials_form("log in", "/loggingin"))
}

/// POST /loggingin
pub async fn logging_in(
    State(state): State<AppState>,
    jar: CookieJar,
    CurrentSession(current): CurrentSession,
    Form(form): Form<LoginForm>,
) -> Result<Response, AppError> {
    match state.auth_service().login(form, current).await {
        Ok(session) => {
            let jar = jar.add(state.session_service().cookie(&session));
            Ok((jar, Redirect::to("/loggedIn")).into_response())
        }
        Err(AppError::Validation(_) | AppError::Authentication) => {
            Ok(Redirect::to("/login").into_response())
        }
        Err(e) => Err(e),
    }
}

/// GET /loggedIn; only reachable with an authenticated session.
pub async fn logged_in(user: AuthenticatedUser) -> Html<String> {
    Html(format!("You are logged in, {}!", escape(&user.username)))
}

/// GET /logout
///
/// Works from the raw cookie so a record that no longer loads is still
/// deleted and the browser cookie still cleared.
pub async fn logout(
    State(state): State<AppState>,
    jar: CookieJar,
) -> Result<(CookieJar, Html<&'static str>), AppError> {
    let sessions = state.session_service();
    let token = jar.get(sessions.cookie_name()).map(|c| c.value());
    state.auth_service().logout(token).await?;
    let jar = jar.remove(sessions.removal_cookie());
    Ok((jar, Html("You are logged out.")))
}
