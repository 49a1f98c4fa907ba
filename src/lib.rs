//! Session-backed authentication demo server built with Rust.
//!
//! Users register and log in through HTML forms; the server keeps session
//! state in a session store and hands the browser only a signed session id.

pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod repositories;
pub mod services;

pub use config::Config;
pub use error::AppError;
pub use handlers::http::AppState;
pub use services::{AuthService, SessionService};

use axum::handler::HandlerWithoutStateExt;
use axum::routing::{get, post, MethodRouter};
use std::path::Path;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

/// Build the router: demo pages, auth flow, static assets, 404.
///
/// A known path requested with the wrong method gets the same 404 page as an
/// unknown path.
pub fn create_app(state: AppState, public_dir: impl AsRef<Path>) -> axum::Router {
    let static_files = ServeDir::new(public_dir.as_ref())
        .call_fallback_on_method_not_allowed(true)
        .fallback(handlers::not_found.into_service());

    axum::Router::new()
        .route("/", or_404(get(handlers::index)))
        .route("/about", or_404(get(handlers::about)))
        .route("/cat/:id", or_404(get(handlers::cat)))
        .route("/contact", or_404(get(handlers::contact)))
        .route("/submitEmail", or_404(post(handlers::submit_email)))
        .route("/createUser", or_404(get(auth::create_user_form)))
        .route("/submitUser", or_404(post(auth::submit_user)))
        .route("/login", or_404(get(auth::login_form)))
        .route("/loggingin", or_404(post(auth::logging_in)))
        .route("/loggedIn", or_404(get(auth::logged_in)))
        .route("/loggedin", or_404(get(auth::logged_in)))
        .route("/logout", or_404(get(auth::logout)))
        .route("/health", or_404(get(handlers::health)))
        .fallback_service(static_files)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Answer methods the route does not handle with the 404 page instead of 405.
fn or_404(route: MethodRouter<AppState>) -> MethodRouter<AppState> {
    route.fallback(handlers::not_found)
}
