use std::net::SocketAddr;

use axum::http::StatusCode;
use axum::{routing::get, Router};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::state::AppState;
use crate::store::StoreError;
use crate::{attendance, auth, progression, users};

pub fn build_app(state: AppState) -> Router {
    Router::new()
        .nest(
            "/api/v1",
            Router::new()
                .merge(auth::router())
                .merge(users::router())
                .merge(attendance::router())
                .merge(progression::router())
                .route("/health", get(|| async { "ok" })),
        )
        .with_state(state)
        .layer(CorsLayer::permissive())
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|req: &axum::http::Request<_>| {
                    let method = req.method().clone();
                    let uri = req.uri().clone();
                    tracing::info_span!("http_request", %method, uri = %uri)
                })
                .on_response(
                    |res: &axum::http::Response<_>,
                     _latency: std::time::Duration,
                     span: &tracing::Span| {
                        let status = res.status();
                        span.record("status", tracing::field::display(status));
                        if status.is_server_error() {
                            tracing::error!(%status, "response");
                        } else {
                            tracing::info!(%status, "response");
                        }
                    },
                ),
        )
}

/// Map store failures onto the wire. `Unavailable` and `StaleLocator` are
/// retryable conditions, never session-fatal.
pub(crate) fn store_reply(e: StoreError) -> (StatusCode, String) {
    let status = match &e {
        StoreError::Unavailable(_) | StoreError::StaleLocator(_) => StatusCode::SERVICE_UNAVAILABLE,
        StoreError::TableNotFound(_) => StatusCode::INTERNAL_SERVER_ERROR,
        StoreError::RowNotFound { .. } => StatusCode::NOT_FOUND,
    };
    tracing::error!(error = %e, %status, "store error");
    (status, e.to_string())
}

pub async fn serve(app: Router) -> anyhow::Result<()> {
    let addr: SocketAddr = format!(
        "{}:{}",
        std::env::var("APP_HOST").unwrap_or_else(|_| "0.0.0.0".into()),
        std::env::var("APP_PORT").unwrap_or_else(|_| "8080".into())
    )
    .parse()?;

    tracing::info!("listening on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}
