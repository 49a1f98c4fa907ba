//! Entry point: load config, wire dependencies, and run the server.

use notes_auth::config::Config;
use notes_auth::db;
use notes_auth::repositories::{PgUserRepository, RedisSessionRepository};
use notes_auth::{create_app, AppState};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let config = Config::from_env().map_err(|e| anyhow::anyhow!("config: {}", e))?;

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.log_level))?;
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();

    let db_pool = db::create_pool(config.database.clone()).await?;
    db::ensure_schema(&db_pool).await?;
    let users = Arc::new(PgUserRepository::new(db_pool));

    let sessions = RedisSessionRepository::connect(&config.redis_url).await?;
    sessions.ping().await?;

    let state = AppState::new(users, Arc::new(sessions), &config)?;
    let app = create_app(state, &config.public_dir);

    tracing::info!(
        addr = %config.server_addr,
        public_dir = %config.public_dir.display(),
        "listening"
    );
    let listener = tokio::net::TcpListener::bind(config.server_addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}
