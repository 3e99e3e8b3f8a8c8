use axum::{
    extract::{Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use time::OffsetDateTime;
use tracing::instrument;

use crate::{
    app::store_reply,
    attendance::{
        dto::{DailyCountResponse, MarkResponse},
        ledger::{AttendanceLedger, AttendanceRecord},
    },
    auth::extractors::{AdminUser, SessionUser},
    clock,
    state::AppState,
};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/attendance/mark", post(mark))
        .route("/attendance/today", get(today_count))
        .route("/attendance/count", get(count_on))
        .route("/attendance", get(all_records))
}

#[instrument(skip(state, session))]
async fn mark(
    State(state): State<AppState>,
    session: SessionUser,
) -> Result<Json<MarkResponse>, (StatusCode, String)> {
    let ledger = AttendanceLedger::new(state.store.clone());
    let outcome = ledger
        .mark_present(&session.user.username, OffsetDateTime::now_utc())
        .await
        .map_err(store_reply)?;
    Ok(Json(outcome.into()))
}

#[instrument(skip(state, _session))]
async fn today_count(
    State(state): State<AppState>,
    _session: SessionUser,
) -> Result<Json<DailyCountResponse>, (StatusCode, String)> {
    let today = clock::ist_today();
    let ledger = AttendanceLedger::new(state.store.clone());
    let present = ledger.count_present_on(today).await.map_err(store_reply)?;
    Ok(Json(DailyCountResponse {
        date: clock::date_string(today),
        present,
    }))
}

#[derive(Debug, Deserialize)]
struct CountQuery {
    date: String,
}

#[instrument(skip(state, _session))]
async fn count_on(
    State(state): State<AppState>,
    _session: SessionUser,
    Query(query): Query<CountQuery>,
) -> Result<Json<DailyCountResponse>, (StatusCode, String)> {
    let date = clock::parse_date(&query.date).map_err(|_| {
        (
            StatusCode::BAD_REQUEST,
            "date must be YYYY-MM-DD".to_string(),
        )
    })?;
    let ledger = AttendanceLedger::new(state.store.clone());
    let present = ledger.count_present_on(date).await.map_err(store_reply)?;
    Ok(Json(DailyCountResponse {
        date: query.date,
        present,
    }))
}

#[instrument(skip(state, _admin))]
async fn all_records(
    State(state): State<AppState>,
    _admin: AdminUser,
) -> Result<Json<Vec<AttendanceRecord>>, (StatusCode, String)> {
    let ledger = AttendanceLedger::new(state.store.clone());
    let records = ledger.all_records().await.map_err(store_reply)?;
    Ok(Json(records))
}
