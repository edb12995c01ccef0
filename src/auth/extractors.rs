use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{request::Parts, StatusCode},
};
use tracing::warn;
use uuid::Uuid;

use super::session::Session;
use crate::state::AppState;

/// Resolves the bearer token to a live session.
pub struct CurrentSession(pub Session);

#[async_trait]
impl FromRequestParts<AppState> for CurrentSession {
    type Rejection = (StatusCode, String);

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        // Read Authorization header
        let auth = parts
            .headers
            .get(axum::http::header::AUTHORIZATION)
            .and_then(|h| h.to_str().ok())
            .ok_or((StatusCode::UNAUTHORIZED, "missing Authorization header".to_string()))?;

        // Expect "Bearer <token>"
        let token = auth
            .strip_prefix("Bearer ")
            .or_else(|| auth.strip_prefix("bearer "))
            .ok_or((StatusCode::UNAUTHORIZED, "invalid auth scheme".to_string()))?;

        let id = Uuid::parse_str(token.trim())
            .map_err(|_| (StatusCode::UNAUTHORIZED, "invalid session token".to_string()))?;

        match state.sessions.get(id).await {
            Some(session) => Ok(CurrentSession(session)),
            None => {
                warn!(session_id = %id, "unknown or ended session");
                Err((StatusCode::UNAUTHORIZED, "session expired".into()))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::session::SessionRegistry;
    use axum::http::Request;

    fn parts_with(auth: Option<&str>) -> Parts {
        let mut req = Request::builder().uri("/api/v1/me");
        if let Some(value) = auth {
            req = req.header(axum::http::header::AUTHORIZATION, value);
        }
        req.body(()).unwrap().into_parts().0
    }

    #[tokio::test]
    async fn resolves_live_session() {
        let state = AppState::fake().await;
        let session = state.sessions.create("alice").await;
        let mut parts = parts_with(Some(&format!("Bearer {}", session.id)));

        let CurrentSession(found) = CurrentSession::from_request_parts(&mut parts, &state)
            .await
            .expect("session resolves");
        assert_eq!(found.id, session.id);
        assert_eq!(found.username, "alice");
    }

    #[tokio::test]
    async fn rejects_missing_malformed_and_ended() {
        let state = AppState::fake().await;

        let mut none = parts_with(None);
        let err = CurrentSession::from_request_parts(&mut none, &state).await.err().unwrap();
        assert_eq!(err.0, StatusCode::UNAUTHORIZED);

        let mut basic = parts_with(Some("Basic abc"));
        assert!(CurrentSession::from_request_parts(&mut basic, &state).await.is_err());

        let mut garbage = parts_with(Some("Bearer not-a-uuid"));
        assert!(CurrentSession::from_request_parts(&mut garbage, &state).await.is_err());

        let session = state.sessions.create("alice").await;
        state.sessions.end(session.id).await;
        let mut ended = parts_with(Some(&format!("Bearer {}", session.id)));
        let err = CurrentSession::from_request_parts(&mut ended, &state).await.err().unwrap();
        assert_eq!(err.1, "session expired");
    }

    #[tokio::test]
    async fn expired_session_is_rejected() {
        let mut state = AppState::fake().await;
        state.sessions = SessionRegistry::new(time::Duration::ZERO);
        let session = state.sessions.create("alice").await;
        let mut parts = parts_with(Some(&format!("Bearer {}", session.id)));

        let err = CurrentSession::from_request_parts(&mut parts, &state)
            .await
            .err()
            .unwrap();
        assert_eq!(err, (StatusCode::UNAUTHORIZED, "session expired".to_string()));
    }
}
