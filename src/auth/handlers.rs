use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use time::OffsetDateTime;
use tracing::{error, info, instrument, warn};

use crate::{
    auth::{
        dto::{LoginRequest, LoginResponse, RegisterRequest, RegisterResponse},
        extractors::CurrentSession,
        repo_types::Account,
    },
    error::RegisterError,
    state::AppState,
};

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/register", post(register))
        .route("/auth/login", post(login))
        .route("/auth/logout", post(logout))
}

pub fn me_routes() -> Router<AppState> {
    Router::new().route("/me", get(get_me))
}

#[instrument(skip(state, payload))]
pub async fn register(
    State(state): State<AppState>,
    Json(payload): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<RegisterResponse>), (StatusCode, String)> {
    if payload.password != payload.password_confirm {
        warn!(username = %payload.username, "password confirmation mismatch");
        return Err((StatusCode::BAD_REQUEST, "Passwords do not match".into()));
    }

    match state
        .accounts
        .register(&payload.username, &payload.password, &payload.email)
        .await
    {
        Ok(user) => Ok((
            StatusCode::CREATED,
            Json(RegisterResponse {
                message: "Registration successful".into(),
                user,
            }),
        )),
        Err(e) => Err(register_rejection(e)),
    }
}

fn register_rejection(e: RegisterError) -> (StatusCode, String) {
    let status = match &e {
        RegisterError::DuplicateUsername => StatusCode::CONFLICT,
        e if e.is_validation() => StatusCode::BAD_REQUEST,
        _ => {
            error!(error = %e, "register failed");
            StatusCode::INTERNAL_SERVER_ERROR
        }
    };
    (status, e.to_string())
}

#[instrument(skip(state, payload))]
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, (StatusCode, String)> {
    let ok = state
        .accounts
        .authenticate(&payload.username, &payload.password)
        .await
        .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))?;
    if !ok {
        return Err((StatusCode::UNAUTHORIZED, "Invalid credentials".into()));
    }

    let user = state
        .accounts
        .find(&payload.username)
        .await
        .ok_or((StatusCode::UNAUTHORIZED, "Invalid credentials".to_string()))?;
    let session = state.sessions.create(&user.username).await;

    info!(username = %user.username, session_id = %session.id, "session started");
    Ok(Json(LoginResponse {
        token: session.id,
        user,
    }))
}

#[instrument(skip(state, session), fields(username = %session.username))]
pub async fn logout(
    State(state): State<AppState>,
    CurrentSession(session): CurrentSession,
) -> StatusCode {
    state.sessions.end(session.id).await;
    let elapsed = OffsetDateTime::now_utc() - session.started_at;
    info!(
        session_id = %session.id,
        duration_secs = elapsed.whole_seconds(),
        "logged out"
    );
    StatusCode::NO_CONTENT
}

#[instrument(skip(state, session))]
pub async fn get_me(
    State(state): State<AppState>,
    CurrentSession(session): CurrentSession,
) -> Result<Json<Account>, (StatusCode, String)> {
    state
        .accounts
        .find(&session.username)
        .await
        .map(Json)
        .ok_or_else(|| {
            error!(username = %session.username, "session user not found");
            (StatusCode::UNAUTHORIZED, "User not found".into())
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    const PASSWORD: &str = "Secur3P@ss";

    fn register_body(username: &str, password: &str, confirm: &str, email: &str) -> RegisterRequest {
        RegisterRequest {
            username: username.into(),
            password: password.into(),
            password_confirm: confirm.into(),
            email: email.into(),
        }
    }

    async fn login_as(state: &AppState, username: &str, password: &str) -> Result<Json<LoginResponse>, (StatusCode, String)> {
        login(
            State(state.clone()),
            Json(LoginRequest {
                username: username.into(),
                password: password.into(),
            }),
        )
        .await
    }

    #[tokio::test]
    async fn register_login_me_logout() {
        let state = AppState::fake().await;

        let (status, Json(body)) = register(
            State(state.clone()),
            Json(register_body("alice", PASSWORD, PASSWORD, "alice@example.com")),
        )
        .await
        .expect("register");
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body.user.username, "alice");

        let Json(login_body) = login_as(&state, "alice", PASSWORD).await.expect("login");
        assert_eq!(login_body.user.username, "alice");
        assert!(login_body.user.last_login.is_some());

        let session = state.sessions.get(login_body.token).await.expect("session");
        let Json(me) = get_me(State(state.clone()), CurrentSession(session.clone()))
            .await
            .expect("me");
        assert_eq!(me.email, "alice@example.com");

        let status = logout(State(state.clone()), CurrentSession(session)).await;
        assert_eq!(status, StatusCode::NO_CONTENT);
        assert!(state.sessions.get(login_body.token).await.is_none());
    }

    #[tokio::test]
    async fn register_rejections_map_to_status() {
        let state = AppState::fake().await;

        let err = register(
            State(state.clone()),
            Json(register_body("bob", PASSWORD, "different", "bob@example.com")),
        )
        .await
        .unwrap_err();
        assert_eq!(err, (StatusCode::BAD_REQUEST, "Passwords do not match".to_string()));

        let err = register(
            State(state.clone()),
            Json(register_body("bob", "short", "short", "bob@example.com")),
        )
        .await
        .unwrap_err();
        assert_eq!(err.0, StatusCode::BAD_REQUEST);

        let (status, _) = register(
            State(state.clone()),
            Json(register_body("bob", PASSWORD, PASSWORD, "bob@example.com")),
        )
        .await
        .unwrap();
        assert_eq!(status, StatusCode::CREATED);
        let err = register(
            State(state.clone()),
            Json(register_body("bob", PASSWORD, PASSWORD, "bob@example.com")),
        )
        .await
        .unwrap_err();
        assert_eq!(err.0, StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn bad_logins_are_indistinguishable() {
        let state = AppState::fake().await;
        let (status, _) = register(
            State(state.clone()),
            Json(register_body("alice", PASSWORD, PASSWORD, "alice@example.com")),
        )
        .await
        .unwrap();
        assert_eq!(status, StatusCode::CREATED);

        let wrong = login_as(&state, "alice", "Wrong#Pass1").await.unwrap_err();
        let unknown = login_as(&state, "nobody", PASSWORD).await.unwrap_err();
        assert_eq!(wrong, unknown);
        assert_eq!(wrong.0, StatusCode::UNAUTHORIZED);
        assert_eq!(state.sessions.len().await, 0);
    }
}
