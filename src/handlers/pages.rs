//! Demo pages: hit counter, about, cats, contact form, and the 404 page.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{Html, IntoResponse, Redirect, Response},
    Form,
};
use axum_extra::extract::CookieJar;
use serde::Deserialize;

use super::html::{css_color, email_form, escape};
use super::http::AppState;
use crate::error::AppError;
use crate::middleware::CurrentSession;

/// GET /: per-session hit counter.
pub async fn index(
    State(state): State<AppState>,
    jar: CookieJar,
    CurrentSession(current): CurrentSession,
) -> Result<(CookieJar, String), AppError> {
    let sessions = state.session_service();
    let session = sessions.record_hit(current).await?;
    let jar = jar.add(sessions.cookie(&session));
    Ok((
        jar,
        format!(
            "Hello! You've visited this page {} time(s)",
            session.page_hits
        ),
    ))
}

#[derive(Debug, Deserialize)]
pub struct AboutQuery {
    #[serde(default)]
    pub color: String,
    #[serde(default)]
    pub bg: String,
}

/// GET /about?color=&bg=
pub async fn about(Query(query): Query<AboutQuery>) -> Html<String> {
    Html(format!(
        "<h1 style='color:{};background-color:{}'>About Us</h1>",
        escape(&css_color(&query.color)),
        escape(&css_color(&query.bg)),
    ))
}

/// GET /cat/:id
pub async fn cat(Path(id): Path<String>) -> Html<String> {
    let body = match id.trim().parse::<i64>() {
        Ok(1) => "Fluffy: <img src='/fluffy.svg' style='width:250px;'><br><a href='/'>Back</a>"
            .to_string(),
        Ok(2) => "This is cat 2".to_string(),
        _ => format!("Invalid cat id: {}", escape(&id)),
    };
    Html(body)
}

#[derive(Debug, Deserialize)]
pub struct ContactQuery {
    pub missing: Option<String>,
}

/// GET /contact
pub async fn contact(Query(query): Query<ContactQuery>) -> Html<String> {
    let mut html = email_form();
    if query.missing.is_some() {
        html.push_str("<br>Email is required");
    }
    Html(html)
}

#[derive(Debug, Deserialize)]
pub struct EmailForm {
    #[serde(default)]
    pub email: String,
}

/// POST /submitEmail; nothing is stored.
pub async fn submit_email(Form(form): Form<EmailForm>) -> Response {
    let email = form.email.trim();
    if email.is_empty() {
        return Redirect::to("/contact?missing=1").into_response();
    }
    Html(format!(
        "Thank you for subscribing with your email: {}",
        escape(email)
    ))
    .into_response()
}

/// Fallback for anything no route or static file matched.
pub async fn not_found() -> (StatusCode, &'static str) {
    (StatusCode::NOT_FOUND, "Page not found - 404")
}
