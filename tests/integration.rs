//! Integration tests: the full router over in-memory stores.
//!
//! Run with `cargo test`. The Postgres/Redis round trip at the bottom runs only
//! when these are set:
//! - `TEST_DATABASE_URL` (Postgres; the users table is created if missing)
//! - `TEST_REDIS_URL` (defaults to redis://127.0.0.1:6379 if unset)

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{header, Request, Response, StatusCode};
use notes_auth::models::SessionRecord;
use notes_auth::repositories::{
    MemorySessionRepository, MemoryUserRepository, PgUserRepository, RedisSessionRepository,
    SessionRepository,
};
use notes_auth::services::SessionSettings;
use notes_auth::{create_app, db, AppError, AppState, Config, SessionService};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tower::util::ServiceExt;

const PUBLIC_DIR: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/public");

fn test_config() -> Config {
    Config::from_lookup(|key| match key {
        "PASSWORD_HASH_ROUNDS" => Some("1".to_string()),
        "SESSION_SECRET" => Some("integration-signing-secret".to_string()),
        "SESSION_STORE_SECRET" => Some("integration-store-secret".to_string()),
        _ => None,
    })
    .unwrap()
}

fn memory_app() -> axum::Router {
    let state = AppState::new(
        Arc::new(MemoryUserRepository::new()),
        Arc::new(MemorySessionRepository::new()),
        &test_config(),
    )
    .unwrap();
    create_app(state, PUBLIC_DIR)
}

async fn get(app: &axum::Router, uri: &str, cookie: Option<&str>) -> Response<Body> {
    let mut req = Request::builder().uri(uri);
    if let Some(cookie) = cookie {
        req = req.header(header::COOKIE, cookie);
    }
    app.clone()
        .oneshot(req.body(Body::empty()).unwrap())
        .await
        .unwrap()
}

async fn post_form(
    app: &axum::Router,
    uri: &str,
    body: &str,
    cookie: Option<&str>,
) -> Response<Body> {
    let mut req = Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded");
    if let Some(cookie) = cookie {
        req = req.header(header::COOKIE, cookie);
    }
    app.clone()
        .oneshot(req.body(Body::from(body.to_string())).unwrap())
        .await
        .unwrap()
}

async fn body_text(res: Response<Body>) -> String {
    let bytes = axum::body::to_bytes(res.into_body(), usize::MAX)
        .await
        .unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

/// `name=value` part of the Set-Cookie header, as a browser would send it back.
fn session_cookie(res: &Response<Body>) -> Option<String> {
    res.headers()
        .get(header::SET_COOKIE)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(';').next())
        .map(str::to_string)
}

fn location(res: &Response<Body>) -> Option<&str> {
    res.headers()
        .get(header::LOCATION)
        .and_then(|v| v.to_str().ok())
}

#[tokio::test]
async fn health_returns_ok() {
    let app = memory_app();
    let res = get(&app, "/health", None).await;
    assert_eq!(res.status(), StatusCode::OK);
    let json: serde_json::Value = serde_json::from_str(&body_text(res).await).unwrap();
    assert_eq!(json.get("status").and_then(|v| v.as_str()), Some("ok"));
}

#[tokio::test]
async fn hit_counter_is_per_session() {
    let app = memory_app();

    let res = get(&app, "/", None).await;
    assert_eq!(res.status(), StatusCode::OK);
    let cookie = session_cookie(&res).expect("first visit sets a session cookie");
    assert_eq!(
        body_text(res).await,
        "Hello! You've visited this page 1 time(s)"
    );

    for expected in [2, 3] {
        let res = get(&app, "/", Some(&cookie)).await;
        assert_eq!(
            body_text(res).await,
            format!("Hello! You've visited this page {} time(s)", expected)
        );
    }

    let res = get(&app, "/", None).await;
    assert_eq!(
        body_text(res).await,
        "Hello! You've visited this page 1 time(s)"
    );
}

#[tokio::test]
async fn register_login_gate_logout() {
    let app = memory_app();

    let res = post_form(&app, "/submitUser", "username=alice&password=secret1", None).await;
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(body_text(res).await, "successfully created user");

    let res = post_form(&app, "/loggingin", "username=alice&password=secret1", None).await;
    assert_eq!(res.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&res), Some("/loggedIn"));
    let cookie = session_cookie(&res).expect("login sets a session cookie");
    let set_cookie = res.headers().get(header::SET_COOKIE).unwrap().to_str().unwrap();
    assert!(set_cookie.contains("HttpOnly"));
    assert!(set_cookie.contains("Max-Age=3600") || set_cookie.contains("Max-Age=3599"));

    let res = get(&app, "/loggedIn", Some(&cookie)).await;
    assert_eq!(res.status(), StatusCode::OK);
    assert!(body_text(res).await.contains("You are logged in"));

    let res = get(&app, "/logout", Some(&cookie)).await;
    assert_eq!(res.status(), StatusCode::OK);
    assert!(body_text(res).await.contains("You are logged out."));

    // even if the browser keeps sending the old cookie
    let res = get(&app, "/loggedIn", Some(&cookie)).await;
    assert_eq!(res.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&res), Some("/login"));
}

#[tokio::test]
async fn logout_without_session_is_harmless() {
    let app = memory_app();
    let res = get(&app, "/logout", None).await;
    assert_eq!(res.status(), StatusCode::OK);
    let res = get(&app, "/logout", Some("notes.sid=nonsense")).await;
    assert_eq!(res.status(), StatusCode::OK);
}

/// Session store holding records that no longer decode, as after a format change.
#[derive(Default)]
struct UndecodableSessionStore {
    deletes: AtomicUsize,
}

#[async_trait]
impl SessionRepository for UndecodableSessionStore {
    async fn load(&self, _key: &str) -> Result<Option<SessionRecord>, AppError> {
        let err = serde_json::from_str::<SessionRecord>("{\"kind\":").unwrap_err();
        Err(AppError::Serialization(err))
    }

    async fn save(
        &self,
        _key: &str,
        _record: &SessionRecord,
        _ttl: Duration,
    ) -> Result<(), AppError> {
        Ok(())
    }

    async fn delete(&self, _key: &str) -> Result<(), AppError> {
        self.deletes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

#[tokio::test]
async fn logout_clears_a_session_that_no_longer_decodes() {
    let config = test_config();
    let store = Arc::new(UndecodableSessionStore::default());
    let users = Arc::new(MemoryUserRepository::new());
    let state = AppState::new(users, store.clone(), &config).unwrap();
    let app = create_app(state, PUBLIC_DIR);

    // a validly signed cookie, minted with the app's own secrets
    let signer = SessionService::new(
        Arc::new(MemorySessionRepository::new()),
        SessionSettings::from_config(&config).unwrap(),
    );
    let record = SessionRecord::anonymous(chrono::Utc::now(), chrono::Duration::hours(1));
    let minted = signer.cookie(&record);
    let cookie = format!("{}={}", minted.name(), minted.value());

    let res = get(&app, "/logout", Some(&cookie)).await;
    assert_eq!(res.status(), StatusCode::OK);
    let cleared = res.headers().get(header::SET_COOKIE).unwrap().to_str().unwrap();
    assert!(cleared.starts_with("notes.sid="));
    assert!(cleared.contains("Max-Age=0"));
    assert_eq!(store.deletes.load(Ordering::SeqCst), 1);

    // other pages start over rather than fail
    let res = get(&app, "/", Some(&cookie)).await;
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(
        body_text(res).await,
        "Hello! You've visited this page 1 time(s)"
    );
}

#[tokio::test]
async fn unknown_user_login_redirects_without_session() {
    let app = memory_app();
    let res = post_form(&app, "/loggingin", "username=bob&password=wrongpass", None).await;
    assert_eq!(res.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&res), Some("/login"));
    assert!(session_cookie(&res).is_none());
}

#[tokio::test]
async fn wrong_password_looks_like_unknown_user() {
    let app = memory_app();
    post_form(&app, "/submitUser", "username=carol&password=right", None).await;

    let wrong = post_form(&app, "/loggingin", "username=carol&password=wrong", None).await;
    let unknown = post_form(&app, "/loggingin", "username=nobody&password=wrong", None).await;
    assert_eq!(wrong.status(), unknown.status());
    assert_eq!(location(&wrong), location(&unknown));
    assert!(session_cookie(&wrong).is_none());
    assert!(session_cookie(&unknown).is_none());
}

#[tokio::test]
async fn duplicate_registration_is_refused() {
    let app = memory_app();
    let res = post_form(&app, "/submitUser", "username=dave&password=first", None).await;
    assert_eq!(res.status(), StatusCode::OK);

    let res = post_form(&app, "/submitUser", "username=dave&password=second", None).await;
    assert_eq!(res.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&res), Some("/createUser?error=taken"));

    // the original password still works
    let res = post_form(&app, "/loggingin", "username=dave&password=first", None).await;
    assert_eq!(location(&res), Some("/loggedIn"));
}

#[tokio::test]
async fn invalid_registration_redirects_to_form() {
    let app = memory_app();
    for body in [
        "username=&password=pw",
        "username=bad%20name&password=pw",
        "username=erin&password=",
        "username=erin&password=aaaaaaaaaaaaaaaaaaaaa",
        "password=pw",
    ] {
        let res = post_form(&app, "/submitUser", body, None).await;
        assert_eq!(res.status(), StatusCode::SEE_OTHER, "{body}");
        assert_eq!(location(&res), Some("/createUser?error=invalid"), "{body}");
    }

    let res = get(&app, "/createUser?error=invalid", None).await;
    assert!(body_text(res).await.contains("1-20 letters or digits"));
}

#[tokio::test]
async fn gated_page_rejects_anonymous_and_forged_sessions() {
    let app = memory_app();

    let res = get(&app, "/loggedIn", None).await;
    assert_eq!(res.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&res), Some("/login"));

    // an anonymous hit-counter session is not a login
    let res = get(&app, "/", None).await;
    let cookie = session_cookie(&res).unwrap();
    let res = get(&app, "/loggedIn", Some(&cookie)).await;
    assert_eq!(location(&res), Some("/login"));

    let res = get(&app, "/loggedIn", Some("notes.sid=abc.def")).await;
    assert_eq!(location(&res), Some("/login"));
}

#[tokio::test]
async fn login_keeps_hit_count_under_new_session_id() {
    let app = memory_app();
    post_form(&app, "/submitUser", "username=frank&password=pw", None).await;

    let res = get(&app, "/", None).await;
    let anon = session_cookie(&res).unwrap();
    get(&app, "/", Some(&anon)).await;

    let res = post_form(&app, "/loggingin", "username=frank&password=pw", Some(&anon)).await;
    let authed = session_cookie(&res).unwrap();
    assert_ne!(authed, anon);

    let res = get(&app, "/", Some(&authed)).await;
    assert_eq!(
        body_text(res).await,
        "Hello! You've visited this page 3 time(s)"
    );

    // the pre-login id no longer resolves
    let res = get(&app, "/", Some(&anon)).await;
    assert_eq!(
        body_text(res).await,
        "Hello! You've visited this page 1 time(s)"
    );
}

#[tokio::test]
async fn about_escapes_query_values() {
    let app = memory_app();
    let res = get(&app, "/about?color=blue&bg=black", None).await;
    assert_eq!(
        body_text(res).await,
        "<h1 style='color:blue;background-color:black'>About Us</h1>"
    );

    let res = get(&app, "/about?color=%27%3E%3Cscript%3E", None).await;
    let body = body_text(res).await;
    assert!(!body.contains("<script>"));
    assert!(!body.contains("'><"));
}

#[tokio::test]
async fn cat_pages() {
    let app = memory_app();
    assert!(body_text(get(&app, "/cat/1", None).await)
        .await
        .contains("<img src='/fluffy.svg'"));
    assert_eq!(
        body_text(get(&app, "/cat/2", None).await).await,
        "This is cat 2"
    );
    assert_eq!(
        body_text(get(&app, "/cat/%3Cb%3E", None).await).await,
        "Invalid cat id: &lt;b&gt;"
    );
}

#[tokio::test]
async fn contact_flow() {
    let app = memory_app();
    let res = get(&app, "/contact", None).await;
    let body = body_text(res).await;
    assert!(body.contains("action='/submitEmail'"));
    assert!(!body.contains("Email is required"));

    let res = post_form(&app, "/submitEmail", "email=", None).await;
    assert_eq!(location(&res), Some("/contact?missing=1"));
    let res = get(&app, "/contact?missing=1", None).await;
    assert!(body_text(res).await.contains("Email is required"));

    let res = post_form(&app, "/submitEmail", "email=a%40b.co", None).await;
    assert_eq!(
        body_text(res).await,
        "Thank you for subscribing with your email: a@b.co"
    );
}

#[tokio::test]
async fn static_assets_and_404() {
    let app = memory_app();
    let res = get(&app, "/fluffy.svg", None).await;
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(
        res.headers().get(header::CONTENT_TYPE).unwrap(),
        "image/svg+xml"
    );
    assert!(body_text(res).await.contains("<svg"));

    let res = get(&app, "/no/such/page", None).await;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    assert_eq!(body_text(res).await, "Page not found - 404");

    let res = post_form(&app, "/no/such/page", "", None).await;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn wrong_method_on_known_path_is_404() {
    let app = memory_app();

    let res = post_form(&app, "/login", "username=a&password=b", None).await;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    assert_eq!(body_text(res).await, "Page not found - 404");

    let res = get(&app, "/submitUser", None).await;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    assert_eq!(body_text(res).await, "Page not found - 404");

    let res = post_form(&app, "/", "", None).await;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn postgres_and_redis_round_trip() {
    let database_url = match std::env::var("TEST_DATABASE_URL") {
        Ok(u) => u,
        Err(_) => {
            eprintln!("Skip integration test: set TEST_DATABASE_URL and TEST_REDIS_URL");
            return;
        }
    };
    let redis_url =
        std::env::var("TEST_REDIS_URL").unwrap_or_else(|_| "redis://127.0.0.1:6379".to_string());

    let options = database_url.parse().expect("TEST_DATABASE_URL must be a postgres URL");
    let pool = match db::create_pool(options).await {
        Ok(p) => p,
        Err(e) => {
            eprintln!("Skip integration test: {}", e);
            return;
        }
    };
    db::ensure_schema(&pool).await.unwrap();
    let sessions = match RedisSessionRepository::connect(&redis_url).await {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Skip integration test: {}", e);
            return;
        }
    };
    sessions.ping().await.unwrap();

    let state = AppState::new(
        Arc::new(PgUserRepository::new(pool)),
        Arc::new(sessions),
        &test_config(),
    )
    .unwrap();
    let app = create_app(state, PUBLIC_DIR);

    let millis = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap()
        .as_millis();
    let username = format!("u{}", millis % 10_000_000_000);
    let form = format!("username={}&password=secret1", username);

    let res = post_form(&app, "/submitUser", &form, None).await;
    assert_eq!(res.status(), StatusCode::OK, "register should succeed");
    let res = post_form(&app, "/submitUser", &form, None).await;
    assert_eq!(location(&res), Some("/createUser?error=taken"));

    let res = post_form(&app, "/loggingin", &form, None).await;
    assert_eq!(location(&res), Some("/loggedIn"));
    let cookie = session_cookie(&res).unwrap();

    let res = get(&app, "/loggedIn", Some(&cookie)).await;
    assert_eq!(res.status(), StatusCode::OK);

    get(&app, "/logout", Some(&cookie)).await;
    let res = get(&app, "/loggedIn", Some(&cookie)).await;
    assert_eq!(location(&res), Some("/login"));
}
