use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::auth::sessions::Snapshot;

/// Request body for login.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

/// Response returned after a successful login.
#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub token: Uuid,
    pub user: Snapshot,
}

/// Request body for changing the caller's own password.
#[derive(Debug, Deserialize)]
pub struct ChangePasswordRequest {
    pub new_password: String,
}
