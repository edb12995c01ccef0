use std::sync::Arc;

use time::OffsetDateTime;
use tokio::sync::Mutex;
use tracing::{error, info, warn};

use crate::auth::password::{is_legacy_digest, verify_password, Hasher};
use crate::auth::repo_types::{Account, AccountRecord, Accounts};
use crate::auth::services::{check_fields, check_format};
use crate::error::{RegisterError, StoreError};
use crate::storage::AccountStore;

/// Registration and authentication over an in-memory copy of every account.
/// The backend is rewritten in full after each successful mutation.
pub struct CredentialStore {
    backend: Arc<dyn AccountStore>,
    hasher: Hasher,
    accounts: Mutex<Accounts>,
    /// False when unloadable data could not be set aside; saves are refused.
    writable: bool,
    /// Verified against for unknown usernames so they cost as much as a
    /// wrong password.
    dummy_hash: Option<String>,
}

impl CredentialStore {
    /// Loads every account from `backend`. A backend that cannot be read
    /// yields an empty store; its data is quarantined first so the next save
    /// does not overwrite it.
    pub async fn open(backend: Arc<dyn AccountStore>, hasher: Hasher) -> Self {
        let mut writable = true;
        let accounts = match backend.load().await {
            Ok(a) => a,
            Err(e) => {
                warn!(error = %e, "account store unreadable; starting with no accounts");
                if let Err(qe) = backend.quarantine().await {
                    error!(error = %qe, "could not set unreadable account store aside; saves disabled");
                    writable = false;
                }
                Accounts::new()
            }
        };
        let dummy_hash = match hasher.hash_password("timing-equaliser") {
            Ok(h) => Some(h),
            Err(e) => {
                warn!(error = %e, "dummy hash unavailable");
                None
            }
        };
        info!(count = accounts.len(), writable, "credential store opened");
        Self {
            backend,
            hasher,
            accounts: Mutex::new(accounts),
            writable,
            dummy_hash,
        }
    }

    async fn persist(&self, accounts: &Accounts) -> Result<(), StoreError> {
        if !self.writable {
            return Err(StoreError::ReadOnly);
        }
        self.backend.save(accounts).await
    }

    pub async fn register(
        &self,
        username: &str,
        password: &str,
        email: &str,
    ) -> Result<Account, RegisterError> {
        check_fields(username, password, email)?;

        let mut accounts = self.accounts.lock().await;
        if accounts.contains_key(username) {
            warn!(%username, "username already registered");
            return Err(RegisterError::DuplicateUsername);
        }
        check_format(password, email)?;

        let password_hash = self
            .hasher
            .hash_password(password)
            .map_err(|e| RegisterError::Hashing(e.to_string()))?;
        let record = AccountRecord {
            password_hash,
            email: email.to_string(),
            created_at: OffsetDateTime::now_utc(),
            last_login: None,
        };
        let account = Account::from_record(username, &record);

        accounts.insert(username.to_string(), record);
        if let Err(e) = self.persist(&accounts).await {
            accounts.remove(username);
            error!(error = %e, %username, "failed to persist new account");
            return Err(e.into());
        }

        info!(%username, "user registered");
        Ok(account)
    }

    /// `Ok(false)` for both an unknown username and a wrong password.
    /// `Err` only when a successful login could not be persisted.
    pub async fn authenticate(&self, username: &str, password: &str) -> Result<bool, StoreError> {
        let mut accounts = self.accounts.lock().await;
        let Some(record) = accounts.get_mut(username) else {
            if let Some(dummy) = &self.dummy_hash {
                let _ = verify_password(password, dummy);
            }
            warn!(%username, "login unknown username");
            return Ok(false);
        };

        let ok = match verify_password(password, &record.password_hash) {
            Ok(v) => v,
            Err(e) => {
                error!(error = %e, %username, "stored password hash unreadable");
                false
            }
        };
        if !ok {
            warn!(%username, "login invalid password");
            return Ok(false);
        }

        let previous = record.clone();
        record.last_login = Some(OffsetDateTime::now_utc());
        if is_legacy_digest(&record.password_hash) {
            match self.hasher.hash_password(password) {
                Ok(h) => {
                    record.password_hash = h;
                    info!(%username, "legacy password digest upgraded");
                }
                Err(e) => warn!(error = %e, %username, "legacy digest upgrade failed"),
            }
        }

        if let Err(e) = self.persist(&accounts).await {
            accounts.insert(username.to_string(), previous);
            error!(error = %e, %username, "failed to persist login");
            return Err(e);
        }

        info!(%username, "user logged in");
        Ok(true)
    }

    pub async fn find(&self, username: &str) -> Option<Account> {
        let accounts = self.accounts.lock().await;
        accounts
            .get(username)
            .map(|record| Account::from_record(username, record))
    }

    #[cfg(test)]
    pub async fn len(&self) -> usize {
        self.accounts.lock().await.len()
    }
}
