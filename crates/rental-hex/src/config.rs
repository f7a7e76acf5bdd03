use serde::Deserialize;
use std::env;
use std::path::PathBuf;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub server_port: String,
    pub database_url: Option<String>,
    /// JSON list of `{ "token": ..., "actor": {...} }` entries.
    pub sessions_file: Option<PathBuf>,
    /// Browser origin allowed to call the API; no CORS layer when unset.
    pub cors_allow_origin: Option<String>,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        let server_port = env::var("SERVER_PORT").unwrap_or_else(|_| "3000".into());
        let database_url = env::var("DATABASE_URL").ok();
        let sessions_file = env::var("SESSIONS_FILE").ok().map(PathBuf::from);
        let cors_allow_origin = env::var("CORS_ALLOW_ORIGIN").ok();
        Ok(Self {
            server_port,
            database_url,
            sessions_file,
            cors_allow_origin,
        })
    }
}
