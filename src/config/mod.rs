//! Application configuration loaded from environment.

use sqlx::postgres::PgConnectOptions;
use std::net::{Ipv4Addr, SocketAddr};
use std::path::PathBuf;
use std::time::Duration;

/// Minimum length, in bytes, of the signing and store secrets.
pub const MIN_SECRET_LEN: usize = 16;

/// Default lifetime of an authenticated session (1 hour).
pub const DEFAULT_SESSION_TTL_MS: u64 = 1000 * 60 * 60;

/// Default lifetime of an anonymous (hit counter only) session (14 days).
pub const DEFAULT_ANONYMOUS_SESSION_TTL_MS: u64 = 1000 * 60 * 60 * 24 * 14;

/// Default password hashing work factor.
pub const DEFAULT_HASH_ROUNDS: u32 = 12;

/// Application configuration loaded from `.env` and environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// Server bind address, `0.0.0.0:$PORT`.
    pub server_addr: SocketAddr,
    /// PostgreSQL connection, built from `DB_*` unless `DATABASE_URL` is set.
    pub database: PgConnectOptions,
    /// Redis connection URL for the session store.
    pub redis_url: String,
    /// Secret used to derive session store keys from session ids.
    pub session_store_secret: String,
    /// Secret used to sign the session cookie.
    pub session_secret: String,
    pub session_cookie_name: String,
    pub cookie_secure: bool,
    /// Lifetime of an authenticated session, counted from login.
    pub session_ttl: Duration,
    /// Lifetime of an anonymous session, counted from creation.
    pub anonymous_session_ttl: Duration,
    /// Password hashing work factor (Argon2 time cost).
    pub hash_rounds: u32,
    /// Directory served for static assets.
    pub public_dir: PathBuf,
    /// Log level: `error`, `warn`, `info`, `debug`, `trace`.
    pub log_level: String,
}

impl Config {
    /// Load configuration from environment. Call `dotenvy::dotenv().ok()` before this.
    pub fn from_env() -> Result<Self, ConfigLoadError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigLoadError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());

        let port: u16 = parse_var(&lookup, "PORT", 3000)?;
        let server_addr = SocketAddr::from((Ipv4Addr::UNSPECIFIED, port));

        let database = match lookup("DATABASE_URL") {
            Some(url) => url
                .parse::<PgConnectOptions>()
                .map_err(|_| ConfigLoadError::Invalid("DATABASE_URL"))?,
            None => {
                let db_host = var("DB_HOST", "localhost:5432");
                let (host, port) = split_host_port(&db_host)?;
                // Set field by field so credentials need no URL escaping.
                PgConnectOptions::new()
                    .host(host)
                    .port(port)
                    .username(&var("DB_USER", "notes"))
                    .password(&var("DB_PASSWORD", "notes"))
                    .database(&var("DB_NAME", "notes"))
            }
        };
        let redis_url = var("REDIS_URL", "redis://127.0.0.1/");

        let session_store_secret = var(
            "SESSION_STORE_SECRET",
            "notes_store_secret_change_in_production",
        );
        let session_secret = var("SESSION_SECRET", "notes_session_secret_change_in_production");
        for (name, value) in [
            ("SESSION_STORE_SECRET", &session_store_secret),
            ("SESSION_SECRET", &session_secret),
        ] {
            if value.len() < MIN_SECRET_LEN {
                return Err(ConfigLoadError::WeakSecret(name));
            }
        }

        let session_cookie_name = var("SESSION_COOKIE_NAME", "notes.sid");
        let cookie_secure: bool = parse_var(&lookup, "COOKIE_SECURE", false)?;
        let session_ttl =
            Duration::from_millis(parse_var(&lookup, "SESSION_TTL_MS", DEFAULT_SESSION_TTL_MS)?);
        let anonymous_session_ttl = Duration::from_millis(parse_var(
            &lookup,
            "ANONYMOUS_SESSION_TTL_MS",
            DEFAULT_ANONYMOUS_SESSION_TTL_MS,
        )?);
        if session_ttl.is_zero() {
            return Err(ConfigLoadError::Invalid("SESSION_TTL_MS"));
        }
        if anonymous_session_ttl.is_zero() {
            return Err(ConfigLoadError::Invalid("ANONYMOUS_SESSION_TTL_MS"));
        }

        let hash_rounds: u32 = parse_var(&lookup, "PASSWORD_HASH_ROUNDS", DEFAULT_HASH_ROUNDS)?;
        if hash_rounds == 0 {
            return Err(ConfigLoadError::Invalid("PASSWORD_HASH_ROUNDS"));
        }

        let public_dir = PathBuf::from(var("PUBLIC_DIR", "public"));
        let log_level = var("LOG_LEVEL", "info");

        Ok(Self {
            server_addr,
            database,
            redis_url,
            session_store_secret,
            session_secret,
            session_cookie_name,
            cookie_secure,
            session_ttl,
            anonymous_session_ttl,
            hash_rounds,
            public_dir,
            log_level,
        })
    }
}

/// `host` or `host:port`; the port defaults to 5432.
fn split_host_port(raw: &str) -> Result<(&str, u16), ConfigLoadError> {
    match raw.rsplit_once(':') {
        Some((host, port)) => port
            .parse()
            .map(|port| (host, port))
            .map_err(|_| ConfigLoadError::Invalid("DB_HOST")),
        None => Ok((raw, 5432)),
    }
}

fn parse_var<F, T>(lookup: &F, key: &'static str, default: T) -> Result<T, ConfigLoadError>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|_| ConfigLoadError::Invalid(key)),
        None => Ok(default),
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigLoadError {
    #[error("Invalid {0}")]
    Invalid(&'static str),

    #[error("{0} must be at least 16 bytes")]
    WeakSecret(&'static str),
}
