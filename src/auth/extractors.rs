use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{request::Parts, StatusCode},
};
use uuid::Uuid;

use crate::auth::sessions::Snapshot;
use crate::state::AppState;
use crate::users::repo::Role;

/// Resolves the bearer token to a live session snapshot.
pub struct SessionUser {
    pub token: Uuid,
    pub user: Snapshot,
}

#[async_trait]
impl FromRequestParts<AppState> for SessionUser {
    type Rejection = (StatusCode, String);

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let auth = parts
            .headers
            .get(axum::http::header::AUTHORIZATION)
            .and_then(|h| h.to_str().ok())
            .ok_or((
                StatusCode::UNAUTHORIZED,
                "missing Authorization header".into(),
            ))?;

        let token = auth
            .strip_prefix("Bearer ")
            .or_else(|| auth.strip_prefix("bearer "))
            .ok_or((StatusCode::UNAUTHORIZED, "invalid auth scheme".into()))?;

        let token = Uuid::parse_str(token.trim())
            .map_err(|_| (StatusCode::UNAUTHORIZED, "malformed session token".into()))?;

        let user = state
            .sessions
            .get(&token)
            .await
            .ok_or((StatusCode::UNAUTHORIZED, "no such session".into()))?;

        Ok(SessionUser { token, user })
    }
}

/// Like `SessionUser`, but only admits Admin sessions.
pub struct AdminUser(pub SessionUser);

#[async_trait]
impl FromRequestParts<AppState> for AdminUser {
    type Rejection = (StatusCode, String);

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let session = SessionUser::from_request_parts(parts, state).await?;
        if session.user.role != Role::Admin {
            return Err((StatusCode::FORBIDDEN, "admin only".into()));
        }
        Ok(AdminUser(session))
    }
}
