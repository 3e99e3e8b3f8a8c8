use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use tracing::{error, info, instrument, warn};

use crate::{
    app::store_reply,
    auth::{
        dto::{ChangePasswordRequest, LoginRequest, LoginResponse},
        extractors::SessionUser,
        sessions::{self, LoginError, Snapshot},
    },
    state::AppState,
    users::repo::UserRepo,
};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/auth/login", post(login))
        .route("/auth/logout", post(logout))
        .route("/me", get(me))
        .route("/me/password", post(change_password))
}

#[instrument(skip(state, payload))]
async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, (StatusCode, String)> {
    let repo = UserRepo::new(state.store.clone());
    let username = payload.username.trim();

    match sessions::login(
        &repo,
        &state.sessions,
        &state.credentials,
        &state.catalog,
        username,
        &payload.password,
    )
    .await
    {
        Ok((token, user)) => Ok(Json(LoginResponse { token, user })),
        Err(LoginError::UnknownUser) => {
            Err((StatusCode::UNAUTHORIZED, "Unknown user".into()))
        }
        Err(LoginError::InvalidCredentials) => {
            Err((StatusCode::UNAUTHORIZED, "Invalid credentials".into()))
        }
        Err(LoginError::Store(e)) => Err(store_reply(e)),
        Err(LoginError::Internal(e)) => {
            error!(error = %e, "login failed");
            Err((StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))
        }
    }
}

#[instrument(skip(state, session))]
async fn logout(State(state): State<AppState>, session: SessionUser) -> StatusCode {
    state.sessions.close(&session.token).await;
    info!(username = %session.user.username, "session closed");
    StatusCode::NO_CONTENT
}

#[instrument(skip(session))]
async fn me(session: SessionUser) -> Json<Snapshot> {
    Json(session.user)
}

#[instrument(skip(state, session, payload))]
async fn change_password(
    State(state): State<AppState>,
    session: SessionUser,
    Json(payload): Json<ChangePasswordRequest>,
) -> Result<StatusCode, (StatusCode, String)> {
    if payload.new_password.is_empty() {
        warn!("empty password rejected");
        return Err((StatusCode::BAD_REQUEST, "Password must not be empty".into()));
    }

    let secret = state.credentials.protect(&payload.new_password).map_err(|e| {
        error!(error = %e, "protect secret failed");
        (StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
    })?;

    let repo = UserRepo::new(state.store.clone());
    repo.update_password(&session.user.username, &secret)
        .await
        .map_err(store_reply)?;

    info!(username = %session.user.username, "password updated");
    Ok(StatusCode::NO_CONTENT)
}
