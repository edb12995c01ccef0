use std::path::PathBuf;

use async_trait::async_trait;
use time::OffsetDateTime;
use tokio::sync::Mutex;
use tracing::{debug, warn};

use crate::auth::repo_types::Accounts;
use crate::error::StoreError;

/// Whole-map persistence for accounts. Every save rewrites the full map.
///
/// There is no cross-process locking: two processes saving the same backend
/// race and the last writer wins.
#[async_trait]
pub trait AccountStore: Send + Sync {
    async fn load(&self) -> Result<Accounts, StoreError>;
    async fn save(&self, accounts: &Accounts) -> Result<(), StoreError>;

    /// Moves unloadable data out of the way so a later `save` cannot destroy
    /// it. Returns where it went, if anywhere.
    async fn quarantine(&self) -> Result<Option<PathBuf>, StoreError> {
        Ok(None)
    }
}

/// Accounts kept in a pretty-printed JSON file keyed by username.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    fn sibling(&self, suffix: &str) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_else(|| "users.json".into());
        name.push(suffix);
        self.path.with_file_name(name)
    }

    fn tmp_path(&self) -> PathBuf {
        self.sibling(".tmp")
    }
}

#[async_trait]
impl AccountStore for JsonFileStore {
    async fn load(&self) -> Result<Accounts, StoreError> {
        let text = match tokio::fs::read_to_string(&self.path).await {
            Ok(t) => t,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "account store not found; starting empty");
                return Ok(Accounts::new());
            }
            Err(source) => {
                return Err(StoreError::Read {
                    path: self.path.clone(),
                    source,
                })
            }
        };
        if text.trim().is_empty() {
            return Ok(Accounts::new());
        }
        let accounts: Accounts = serde_json::from_str(&text)?;
        debug!(path = %self.path.display(), count = accounts.len(), "account store loaded");
        Ok(accounts)
    }

    async fn save(&self, accounts: &Accounts) -> Result<(), StoreError> {
        let data = serde_json::to_string_pretty(accounts)?;

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent)
                    .await
                    .map_err(|source| StoreError::Write {
                        path: parent.to_path_buf(),
                        source,
                    })?;
            }
        }

        // tmp + rename so readers never see a half-written file
        let tmp = self.tmp_path();
        tokio::fs::write(&tmp, data.as_bytes())
            .await
            .map_err(|source| StoreError::Write {
                path: tmp.clone(),
                source,
            })?;
        tokio::fs::rename(&tmp, &self.path)
            .await
            .map_err(|source| StoreError::Write {
                path: self.path.clone(),
                source,
            })?;

        debug!(path = %self.path.display(), count = accounts.len(), "account store saved");
        Ok(())
    }

    async fn quarantine(&self) -> Result<Option<PathBuf>, StoreError> {
        if !tokio::fs::try_exists(&self.path).await.unwrap_or(false) {
            return Ok(None);
        }
        let stamp = OffsetDateTime::now_utc().unix_timestamp();
        let target = self.sibling(&format!(".corrupt-{stamp}"));
        tokio::fs::rename(&self.path, &target)
            .await
            .map_err(|source| StoreError::Write {
                path: target.clone(),
                source,
            })?;
        warn!(
            path = %self.path.display(),
            moved_to = %target.display(),
            "unloadable account store set aside"
        );
        Ok(Some(target))
    }
}

/// In-process backend: tests, and `USERS_DB_PATH=:memory:` for throwaway runs.
#[derive(Debug, Default)]
pub struct MemoryStore {
    accounts: Mutex<Accounts>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[cfg(test)]
impl MemoryStore {
    pub fn with_accounts(accounts: Accounts) -> Self {
        Self {
            accounts: Mutex::new(accounts),
        }
    }

    pub async fn snapshot(&self) -> Accounts {
        self.accounts.lock().await.clone()
    }
}

#[async_trait]
impl AccountStore for MemoryStore {
    async fn load(&self) -> Result<Accounts, StoreError> {
        Ok(self.accounts.lock().await.clone())
    }

    async fn save(&self, accounts: &Accounts) -> Result<(), StoreError> {
        *self.accounts.lock().await = accounts.clone();
        Ok(())
    }
}
