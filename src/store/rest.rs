use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::Serialize;
use tracing::{debug, warn};

use super::{Row, RowLocator, StoreError, TabularStore};

const MAX_ATTEMPTS: u32 = 3;
const INITIAL_BACKOFF: Duration = Duration::from_millis(250);

/// Client for the spreadsheet-bridge REST API:
///
///   GET    {base}/tables/{table}/rows
///   POST   {base}/tables/{table}/rows
///   PATCH  {base}/tables/{table}/rows/{row}/cells/{column}
///
/// The bridge fronts the actual sheet and owns its auth handshake; this
/// client only carries an optional bearer token for the bridge itself.
/// Transient failures are retried here with exponential backoff so callers
/// never implement their own retry loops.
pub struct RestStore {
    http: reqwest::Client,
    base_url: String,
    api_token: Option<String>,
}

#[derive(Serialize)]
struct CellPatch<'a> {
    value: &'a str,
}

impl RestStore {
    pub fn new(base_url: &str, api_token: Option<String>, timeout: Duration) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_token,
        })
    }

    fn rows_url(&self, table: &str) -> String {
        format!("{}/tables/{}/rows", self.base_url, table)
    }

    fn cell_url(&self, table: &str, locator: RowLocator, column: &str) -> String {
        format!(
            "{}/tables/{}/rows/{}/cells/{}",
            self.base_url, table, locator.row, column
        )
    }

    fn authed(&self, req: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.api_token {
            Some(token) => req.bearer_auth(token),
            None => req,
        }
    }

    async fn with_retry<T, F, Fut>(&self, op: &'static str, mut call: F) -> Result<T, StoreError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, StoreError>>,
    {
        let mut delay = INITIAL_BACKOFF;
        let mut attempt = 1;
        loop {
            match call().await {
                Err(StoreError::Unavailable(reason)) if attempt < MAX_ATTEMPTS => {
                    warn!(op, attempt, %reason, "transient store failure, backing off");
                    tokio::time::sleep(delay).await;
                    delay *= 2;
                    attempt += 1;
                }
                other => return other,
            }
        }
    }
}

fn transport_error(e: reqwest::Error) -> StoreError {
    StoreError::Unavailable(e.to_string())
}

fn table_status(table: &str, status: StatusCode) -> StoreError {
    match status {
        StatusCode::NOT_FOUND => StoreError::TableNotFound(table.to_string()),
        s => StoreError::Unavailable(format!("bridge answered {s}")),
    }
}

fn cell_status(locator: RowLocator, status: StatusCode) -> StoreError {
    match status {
        // The bridge answers 404/409 when the addressed row vanished or
        // moved since it was located.
        StatusCode::NOT_FOUND | StatusCode::CONFLICT => StoreError::StaleLocator(locator.row),
        s => StoreError::Unavailable(format!("bridge answered {s}")),
    }
}

#[async_trait]
impl TabularStore for RestStore {
    async fn fetch_rows(&self, table: &str) -> Result<Vec<Row>, StoreError> {
        self.with_retry("fetch_rows", || async move {
            let resp = self
                .authed(self.http.get(self.rows_url(table)))
                .send()
                .await
                .map_err(transport_error)?;
            if !resp.status().is_success() {
                return Err(table_status(table, resp.status()));
            }
            let rows: Vec<Row> = resp.json().await.map_err(transport_error)?;
            debug!(table, count = rows.len(), "fetched rows");
            Ok(rows)
        })
        .await
    }

    async fn append_row(&self, table: &str, row: Row) -> Result<(), StoreError> {
        self.with_retry("append_row", || {
            let row = row.clone();
            async move {
                let resp = self
                    .authed(self.http.post(self.rows_url(table)))
                    .json(&row)
                    .send()
                    .await
                    .map_err(transport_error)?;
                if !resp.status().is_success() {
                    return Err(table_status(table, resp.status()));
                }
                debug!(table, "appended row");
                Ok(())
            }
        })
        .await
    }

    async fn find_row(
        &self,
        table: &str,
        key_column: &str,
        key_value: &str,
    ) -> Result<Option<RowLocator>, StoreError> {
        // The bridge has no lookup endpoint; scan like gspread's `find`.
        let rows = self.fetch_rows(table).await?;
        Ok(rows
            .iter()
            .position(|r| r.get(key_column).map(String::as_str) == Some(key_value))
            .map(|idx| RowLocator {
                row: (idx + 1) as u32,
            }))
    }

    async fn update_cell(
        &self,
        table: &str,
        locator: RowLocator,
        column: &str,
        value: &str,
    ) -> Result<(), StoreError> {
        self.with_retry("update_cell", || async move {
            let resp = self
                .authed(self.http.patch(self.cell_url(table, locator, column)))
                .json(&CellPatch { value })
                .send()
                .await
                .map_err(transport_error)?;
            if !resp.status().is_success() {
                return Err(cell_status(locator, resp.status()));
            }
            debug!(table, row = locator.row, column, "updated cell");
            Ok(())
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn bridge() -> RestStore {
        RestStore::new("http://127.0.0.1:9", None, Duration::from_secs(1)).expect("client")
    }

    #[tokio::test]
    async fn transient_failure_is_retried_until_it_clears() {
        let rest = bridge();
        let attempts = AtomicU32::new(0);
        let result = rest
            .with_retry("op", || {
                let n = attempts.fetch_add(1, Ordering::SeqCst);
                async move {
                    if n == 0 {
                        Err(StoreError::Unavailable("connection reset".into()))
                    } else {
                        Ok(n)
                    }
                }
            })
            .await;
        assert_eq!(result.unwrap(), 1);
        assert_eq!(attempts.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn gives_up_after_three_transient_attempts() {
        let rest = bridge();
        let attempts = AtomicU32::new(0);
        let result: Result<(), StoreError> = rest
            .with_retry("op", || {
                let n = attempts.fetch_add(1, Ordering::SeqCst);
                async move { Err(StoreError::Unavailable(format!("attempt {n}"))) }
            })
            .await;
        assert!(matches!(result, Err(StoreError::Unavailable(_))));
        assert_eq!(attempts.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn non_transient_errors_are_not_retried() {
        let rest = bridge();
        let attempts = AtomicU32::new(0);
        let result: Result<(), StoreError> = rest
            .with_retry("op", || {
                attempts.fetch_add(1, Ordering::SeqCst);
                async move { Err(StoreError::TableNotFound("Users".into())) }
            })
            .await;
        assert!(matches!(result, Err(StoreError::TableNotFound(_))));
        assert_eq!(attempts.load(Ordering::SeqCst), 1);
    }
}
