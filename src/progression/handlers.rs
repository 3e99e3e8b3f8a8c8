use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use tracing::instrument;

use crate::{
    app::store_reply,
    auth::extractors::SessionUser,
    progression::{
        dto::{ModuleDetail, ModuleSummary, SubmitRequest, SubmitResponse},
        engine::{self, QuizOutcome},
    },
    state::AppState,
    users::repo::UserRepo,
};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/modules", get(list_modules))
        .route("/modules/:index", get(module_detail))
        .route("/modules/:index/submit", post(submit))
}

#[instrument(skip(state, session))]
async fn list_modules(
    State(state): State<AppState>,
    session: SessionUser,
) -> Json<Vec<ModuleSummary>> {
    let level = session.user.level;
    Json(
        state
            .catalog
            .iter()
            .map(|m| ModuleSummary::of(m, level))
            .collect(),
    )
}

#[instrument(skip(state, session))]
async fn module_detail(
    State(state): State<AppState>,
    session: SessionUser,
    Path(index): Path<u32>,
) -> Result<Json<ModuleDetail>, (StatusCode, String)> {
    let module = state
        .catalog
        .get(index)
        .ok_or((StatusCode::NOT_FOUND, format!("no module {index}")))?;
    if module.index > session.user.level {
        return Err((
            StatusCode::FORBIDDEN,
            format!("module {index} is locked, clear module {} first", index - 1),
        ));
    }
    Ok(Json(ModuleDetail::of(module)))
}

#[instrument(skip(state, session, payload))]
async fn submit(
    State(state): State<AppState>,
    session: SessionUser,
    Path(index): Path<u32>,
    Json(payload): Json<SubmitRequest>,
) -> Result<Json<SubmitResponse>, (StatusCode, String)> {
    let module = state
        .catalog
        .get(index)
        .ok_or((StatusCode::NOT_FOUND, format!("no module {index}")))?;

    let repo = UserRepo::new(state.store.clone());
    let outcome = engine::submit(&repo, module, &session.user, &payload.answer)
        .await
        .map_err(store_reply)?;

    if let QuizOutcome::Advanced { user } = &outcome {
        state.sessions.refresh(&session.token, user.clone()).await;
    }

    Ok(Json(SubmitResponse::of(outcome, session.user)))
}
