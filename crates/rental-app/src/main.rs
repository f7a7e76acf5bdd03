use std::sync::Arc;

use rental_hex::auth::StaticSessions;
use rental_hex::config::Config;
use rental_hex::inbound::http::{AppState, HttpServer, HttpServerConfig};
use rental_repo::{build_repo, Repo};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env for DATABASE_URL / SERVER_PORT / SESSIONS_FILE when present.
    let _ = dotenvy::dotenv();
    tracing_subscriber::fmt()
        .with_env_filter(std::env::var("RUST_LOG").unwrap_or_else(|_| "debug".to_string()))
        .init();

    let config = Config::from_env()?;
    let repo: Repo = build_repo(config.database_url.as_deref()).await?;

    let sessions = match &config.sessions_file {
        Some(path) => StaticSessions::from_file(path)?,
        None => {
            tracing::warn!("SESSIONS_FILE not set; every authenticated route will answer 401");
            StaticSessions::new()
        }
    };
    tracing::info!(sessions = sessions.len(), "session directory loaded");

    let server_cfg = HttpServerConfig {
        port: config.server_port.clone(),
        cors_allow_origin: config.cors_allow_origin.clone(),
    };

    let http = HttpServer::new(AppState::new(repo, Arc::new(sessions)), server_cfg).await?;
    http.run().await
}
