use std::collections::HashMap;
use std::sync::Arc;

use time::{Duration, OffsetDateTime};
use tokio::sync::RwLock;
use tracing::debug;
use uuid::Uuid;

use crate::materials::repo_types::Table;

/// One logged-in client. Lives in process memory only.
#[derive(Debug, Clone)]
pub struct Session {
    pub id: Uuid,
    pub username: String,
    pub started_at: OffsetDateTime,
    pub expires_at: OffsetDateTime,
    /// Materials table loaded for this session, read-only once set.
    pub table: Option<Arc<Table>>,
}

impl Session {
    pub fn is_expired(&self, now: OffsetDateTime) -> bool {
        now >= self.expires_at
    }
}

/// Live sessions keyed by their bearer token. Each session expires `ttl`
/// after login whether or not it was logged out.
#[derive(Clone)]
pub struct SessionRegistry {
    inner: Arc<RwLock<HashMap<Uuid, Session>>>,
    ttl: Duration,
}

impl SessionRegistry {
    pub fn new(ttl: Duration) -> Self {
        Self {
            inner: Arc::default(),
            ttl,
        }
    }

    /// Starts a session after a successful login, dropping any that have
    /// expired.
    pub async fn create(&self, username: &str) -> Session {
        let now = OffsetDateTime::now_utc();
        let session = Session {
            id: Uuid::new_v4(),
            username: username.to_string(),
            started_at: now,
            expires_at: now + self.ttl,
            table: None,
        };

        let mut sessions = self.inner.write().await;
        let before = sessions.len();
        sessions.retain(|_, s| !s.is_expired(now));
        let pruned = before - sessions.len();
        sessions.insert(session.id, session.clone());
        debug!(
            session_id = %session.id,
            %username,
            pruned,
            live = sessions.len(),
            "session created"
        );
        session
    }

    /// The live session for `id`; expired sessions are never returned.
    pub async fn get(&self, id: Uuid) -> Option<Session> {
        let now = OffsetDateTime::now_utc();
        self.inner
            .read()
            .await
            .get(&id)
            .filter(|s| !s.is_expired(now))
            .cloned()
    }

    /// Keeps the first table attached to a session; later calls return it
    /// unchanged. `None` when the session is gone or expired.
    pub async fn attach_table(&self, id: Uuid, table: Arc<Table>) -> Option<Arc<Table>> {
        let now = OffsetDateTime::now_utc();
        let mut sessions = self.inner.write().await;
        let session = sessions.get_mut(&id).filter(|s| !s.is_expired(now))?;
        Some(session.table.get_or_insert(table).clone())
    }

    /// Tears a session down. Returns false if it did not exist.
    pub async fn end(&self, id: Uuid) -> bool {
        let removed = self.inner.write().await.remove(&id);
        if let Some(s) = &removed {
            debug!(session_id = %id, username = %s.username, "session ended");
        }
        removed.is_some()
    }

    #[cfg(test)]
    pub async fn len(&self) -> usize {
        self.inner.read().await.len()
    }
}
