use std::path::PathBuf;

use anyhow::Context;
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub users_db_path: PathBuf,
    pub materials_path: PathBuf,
    pub session_ttl_minutes: i64,
    pub server: ServerConfig,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let users_db_path = std::env::var("USERS_DB_PATH")
            .unwrap_or_else(|_| "users.json".into())
            .into();
        let materials_path = std::env::var("MATERIALS_PATH")
            .unwrap_or_else(|_| "materials.json".into())
            .into();
        let session_ttl_minutes = std::env::var("SESSION_TTL_MINUTES")
            .ok()
            .and_then(|v| v.parse::<i64>().ok())
            .filter(|m| *m > 0)
            .unwrap_or(60);
        let server = ServerConfig {
            host: std::env::var("APP_HOST").unwrap_or_else(|_| "0.0.0.0".into()),
            port: match std::env::var("APP_PORT") {
                Ok(v) => v
                    .parse::<u16>()
                    .with_context(|| format!("invalid APP_PORT {v:?}"))?,
                Err(_) => 8080,
            },
        };
        Ok(Self {
            users_db_path,
            materials_path,
            session_ttl_minutes,
            server,
        })
    }
}
