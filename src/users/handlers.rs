use axum::{extract::State, http::StatusCode, routing::get, Json, Router};
use tracing::instrument;

use crate::{
    app::store_reply,
    auth::extractors::AdminUser,
    state::AppState,
    users::repo::{User, UserRepo},
};

pub fn routes() -> Router<AppState> {
    Router::new().route("/users", get(all_users))
}

#[instrument(skip(state, _admin))]
async fn all_users(
    State(state): State<AppState>,
    _admin: AdminUser,
) -> Result<Json<Vec<User>>, (StatusCode, String)> {
    let repo = UserRepo::new(state.store.clone());
    let users = repo.all().await.map_err(store_reply)?;
    Ok(Json(users))
}
