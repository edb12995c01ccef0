use crate::auth::password::Hasher;
use crate::auth::repo::CredentialStore;
use crate::auth::session::SessionRegistry;
use crate::config::AppConfig;
use crate::storage::{AccountStore, JsonFileStore, MemoryStore};
use std::sync::Arc;
use time::Duration;

/// `USERS_DB_PATH` value selecting the in-memory account backend.
const MEMORY_DB: &str = ":memory:";

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub accounts: Arc<CredentialStore>,
    pub sessions: SessionRegistry,
}

impl AppState {
    pub async fn init() -> anyhow::Result<Self> {
        let config = Arc::new(AppConfig::from_env()?);

        let backend: Arc<dyn AccountStore> = if config.users_db_path.as_os_str() == MEMORY_DB {
            tracing::warn!("USERS_DB_PATH is {MEMORY_DB}; accounts will not outlive the process");
            Arc::new(MemoryStore::new())
        } else {
            Arc::new(JsonFileStore::new(&config.users_db_path))
        };
        let accounts = Arc::new(CredentialStore::open(backend, Hasher::default()).await);

        Ok(Self::from_parts(config, accounts))
    }

    pub fn from_parts(config: Arc<AppConfig>, accounts: Arc<CredentialStore>) -> Self {
        let sessions = SessionRegistry::new(Duration::minutes(config.session_ttl_minutes));
        Self {
            config,
            accounts,
            sessions,
        }
    }

    #[cfg(test)]
    pub async fn fake() -> Self {
        Self::fake_with_materials("materials.json".into()).await
    }

    #[cfg(test)]
    pub async fn fake_with_materials(materials_path: std::path::PathBuf) -> Self {
        let config = Arc::new(AppConfig {
            users_db_path: "users.json".into(),
            materials_path,
            session_ttl_minutes: 60,
            server: crate::config::ServerConfig {
                host: "127.0.0.1".into(),
                port: 0,
            },
        });
        let backend = Arc::new(MemoryStore::new()) as Arc<dyn AccountStore>;
        let accounts = Arc::new(CredentialStore::open(backend, Hasher::light()).await);
        Self::from_parts(config, accounts)
    }
}
