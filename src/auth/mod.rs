use crate::state::AppState;
use axum::Router;

pub mod dto;
pub(crate) mod extractors;
pub mod handlers;
pub mod password;
pub mod sessions;

pub fn router() -> Router<AppState> {
    handlers::routes()
}
