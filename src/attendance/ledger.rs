use std::sync::Arc;

use serde::Serialize;
use time::{Date, OffsetDateTime};
use tracing::info;

use crate::clock;
use crate::store::{row, Row, StoreError, TabularStore};

pub const TABLE: &str = "Attendance";
pub const COL_DATE: &str = "Date";
pub const COL_TIME: &str = "Time";
pub const COL_NAME: &str = "Name";
pub const COL_STATUS: &str = "Status";

pub const STATUS_PRESENT: &str = "Present";

/// One row of the Attendance table. Append-only; rows are never edited or
/// removed.
#[derive(Debug, Clone, Serialize)]
pub struct AttendanceRecord {
    pub date: String,
    pub time: String,
    pub username: String,
    pub status: String,
}

/// Outcome of a mark request. `AlreadyMarked` is a normal result, not an
/// error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MarkOutcome {
    Marked { date: String, time: String },
    AlreadyMarked,
}

#[derive(Clone)]
pub struct AttendanceLedger {
    store: Arc<dyn TabularStore>,
}

fn record_from_row(r: &Row) -> AttendanceRecord {
    let cell = |c: &str| r.get(c).cloned().unwrap_or_default();
    AttendanceRecord {
        date: cell(COL_DATE),
        time: cell(COL_TIME),
        username: cell(COL_NAME),
        status: cell(COL_STATUS),
    }
}

impl AttendanceLedger {
    pub fn new(store: Arc<dyn TabularStore>) -> Self {
        Self { store }
    }

    pub async fn all_records(&self) -> Result<Vec<AttendanceRecord>, StoreError> {
        let rows = self.store.fetch_rows(TABLE).await?;
        Ok(rows.iter().map(record_from_row).collect())
    }

    /// Whether the user already has a row for the given civil date. Always a
    /// fresh scan; duplicate rows from racing marks collapse to `true`.
    pub async fn has_marked_today(&self, username: &str, today: Date) -> Result<bool, StoreError> {
        let date = clock::date_string(today);
        let rows = self.store.fetch_rows(TABLE).await?;
        Ok(rows.iter().any(|r| {
            r.get(COL_NAME).map(String::as_str) == Some(username)
                && r.get(COL_DATE).map(String::as_str) == Some(date.as_str())
        }))
    }

    /// Mark the user present for the IST civil day containing `now`. The
    /// check and the append are two separate store round trips, so two
    /// near-simultaneous calls can both append; that race is accepted and
    /// readers de-duplicate by (name, date).
    pub async fn mark_present(
        &self,
        username: &str,
        now: OffsetDateTime,
    ) -> Result<MarkOutcome, StoreError> {
        let ist = now.to_offset(clock::IST);
        if self.has_marked_today(username, ist.date()).await? {
            return Ok(MarkOutcome::AlreadyMarked);
        }

        let date = clock::date_string(ist.date());
        let time = clock::time_string(ist);
        self.store
            .append_row(
                TABLE,
                row(&[
                    (COL_DATE, &date),
                    (COL_TIME, &time),
                    (COL_NAME, username),
                    (COL_STATUS, STATUS_PRESENT),
                ]),
            )
            .await?;
        info!(username, %date, %time, "attendance marked");
        Ok(MarkOutcome::Marked { date, time })
    }

    /// Raw row count for a date. Deliberately does not de-duplicate by user,
    /// so racing duplicate marks inflate it.
    pub async fn count_present_on(&self, date: Date) -> Result<usize, StoreError> {
        let date = clock::date_string(date);
        let rows = self.store.fetch_rows(TABLE).await?;
        Ok(rows
            .iter()
            .filter(|r| r.get(COL_DATE).map(String::as_str) == Some(date.as_str()))
            .count())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::memory::MemoryStore;
    use time::macros::datetime;

    fn ledger() -> AttendanceLedger {
        AttendanceLedger::new(Arc::new(MemoryStore::new().seed(TABLE, vec![])))
    }

    #[tokio::test]
    async fn first_mark_appends_one_ist_row() {
        let ledger = ledger();
        let outcome = ledger
            .mark_present("Nova", datetime!(2024-05-01 09:00:00 +5:30))
            .await
            .expect("mark");
        assert_eq!(
            outcome,
            MarkOutcome::Marked {
                date: "2024-05-01".into(),
                time: "09:00:00".into(),
            }
        );

        let records = ledger.all_records().await.unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].username, "Nova");
        assert_eq!(records[0].status, STATUS_PRESENT);
    }

    #[tokio::test]
    async fn second_mark_same_day_is_already_marked() {
        let ledger = ledger();
        ledger
            .mark_present("Nova", datetime!(2024-05-01 09:00:00 +5:30))
            .await
            .unwrap();
        let outcome = ledger
            .mark_present("Nova", datetime!(2024-05-01 14:00:00 +5:30))
            .await
            .unwrap();
        assert_eq!(outcome, MarkOutcome::AlreadyMarked);
        assert_eq!(ledger.all_records().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn next_day_marks_again() {
        let ledger = ledger();
        ledger
            .mark_present("Nova", datetime!(2024-05-01 09:00:00 +5:30))
            .await
            .unwrap();
        let outcome = ledger
            .mark_present("Nova", datetime!(2024-05-02 09:00:00 +5:30))
            .await
            .unwrap();
        assert!(matches!(outcome, MarkOutcome::Marked { .. }));
        assert_eq!(ledger.all_records().await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn utc_instants_group_by_ist_civil_date() {
        let ledger = ledger();
        // 22:00 UTC on Apr 30 is 03:30 IST on May 1.
        let outcome = ledger
            .mark_present("Nova", datetime!(2024-04-30 22:00:00 UTC))
            .await
            .unwrap();
        assert_eq!(
            outcome,
            MarkOutcome::Marked {
                date: "2024-05-01".into(),
                time: "03:30:00".into(),
            }
        );
        assert!(ledger
            .has_marked_today("Nova", time::macros::date!(2024-05-01))
            .await
            .unwrap());
    }

    #[tokio::test]
    async fn daily_count_does_not_dedupe_users() {
        let ledger = ledger();
        ledger
            .mark_present("Nova", datetime!(2024-05-01 09:00:00 +5:30))
            .await
            .unwrap();
        ledger
            .mark_present("Vega", datetime!(2024-05-01 10:00:00 +5:30))
            .await
            .unwrap();
        // A raced duplicate lands directly in the table.
        ledger
            .store
            .append_row(
                TABLE,
                row(&[
                    (COL_DATE, "2024-05-01"),
                    (COL_TIME, "09:00:01"),
                    (COL_NAME, "Nova"),
                    (COL_STATUS, STATUS_PRESENT),
                ]),
            )
            .await
            .unwrap();

        let day = time::macros::date!(2024-05-01);
        assert_eq!(ledger.count_present_on(day).await.unwrap(), 3);
        // The per-user check still collapses duplicates.
        assert!(ledger.has_marked_today("Nova", day).await.unwrap());
        assert_eq!(
            ledger
                .count_present_on(time::macros::date!(2024-05-02))
                .await
                .unwrap(),
            0
        );
    }
}
