use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::{Row, RowLocator, StoreError, TabularStore};

/// In-process table map honoring the full `TabularStore` contract, including
/// stale-locator behavior. Backs tests and the local mode used when no bridge
/// endpoint is configured.
#[derive(Default)]
pub struct MemoryStore {
    tables: RwLock<HashMap<String, Vec<Row>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a table (possibly empty) with the given rows, replacing any
    /// previous content. Builder-style, for setup before the store is shared.
    pub fn seed(mut self, table: &str, rows: Vec<Row>) -> Self {
        self.tables.get_mut().insert(table.to_string(), rows);
        self
    }

    /// Remove a row out from under any outstanding locators. Test hook for
    /// exercising `StaleLocator` handling.
    pub async fn delete_row(&self, table: &str, locator: RowLocator) {
        if let Some(rows) = self.tables.write().await.get_mut(table) {
            let idx = (locator.row - 1) as usize;
            if idx < rows.len() {
                rows.remove(idx);
            }
        }
    }
}

#[async_trait]
impl TabularStore for MemoryStore {
    async fn fetch_rows(&self, table: &str) -> Result<Vec<Row>, StoreError> {
        let tables = self.tables.read().await;
        tables
            .get(table)
            .cloned()
            .ok_or_else(|| StoreError::TableNotFound(table.to_string()))
    }

    async fn append_row(&self, table: &str, row: Row) -> Result<(), StoreError> {
        let mut tables = self.tables.write().await;
        let rows = tables
            .get_mut(table)
            .ok_or_else(|| StoreError::TableNotFound(table.to_string()))?;
        rows.push(row);
        Ok(())
    }

    async fn find_row(
        &self,
        table: &str,
        key_column: &str,
        key_value: &str,
    ) -> Result<Option<RowLocator>, StoreError> {
        let tables = self.tables.read().await;
        let rows = tables
            .get(table)
            .ok_or_else(|| StoreError::TableNotFound(table.to_string()))?;
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
        let mut tables = self.tables.write().await;
        let rows = tables
            .get_mut(table)
            .ok_or_else(|| StoreError::TableNotFound(table.to_string()))?;
        let idx = (locator.row.max(1) - 1) as usize;
        let row = rows
            .get_mut(idx)
            .ok_or(StoreError::StaleLocator(locator.row))?;
        row.insert(column.to_string(), value.to_string());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::row;

    fn store() -> MemoryStore {
        MemoryStore::new().seed(
            "Users",
            vec![
                row(&[("Username", "Nova"), ("Level", "1")]),
                row(&[("Username", "Vega"), ("Level", "4")]),
            ],
        )
    }

    #[tokio::test]
    async fn fetch_returns_seeded_rows() {
        let rows = store().fetch_rows("Users").await.expect("fetch");
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].get("Username").map(String::as_str), Some("Nova"));
    }

    #[tokio::test]
    async fn fetch_missing_table_is_an_error() {
        let err = store().fetch_rows("Ghost").await.unwrap_err();
        assert!(matches!(err, StoreError::TableNotFound(_)));
    }

    #[tokio::test]
    async fn append_then_fetch_sees_new_row() {
        let s = store();
        s.append_row("Users", row(&[("Username", "Lyra"), ("Level", "1")]))
            .await
            .expect("append");
        assert_eq!(s.fetch_rows("Users").await.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn find_row_resolves_by_key() {
        let loc = store()
            .find_row("Users", "Username", "Vega")
            .await
            .expect("find")
            .expect("present");
        assert_eq!(loc.row, 2);
    }

    #[tokio::test]
    async fn find_row_misses_unknown_key() {
        let loc = store()
            .find_row("Users", "Username", "Orion")
            .await
            .expect("find");
        assert!(loc.is_none());
    }

    #[tokio::test]
    async fn update_cell_overwrites_in_place() {
        let s = store();
        let loc = s
            .find_row("Users", "Username", "Nova")
            .await
            .unwrap()
            .unwrap();
        s.update_cell("Users", loc, "Level", "2").await.expect("update");
        let rows = s.fetch_rows("Users").await.unwrap();
        assert_eq!(rows[0].get("Level").map(String::as_str), Some("2"));
    }

    #[tokio::test]
    async fn update_through_dead_locator_is_stale() {
        let s = store();
        let loc = s
            .find_row("Users", "Username", "Vega")
            .await
            .unwrap()
            .unwrap();
        s.delete_row("Users", loc).await;
        let err = s.update_cell("Users", loc, "Level", "5").await.unwrap_err();
        assert!(matches!(err, StoreError::StaleLocator(2)));
    }
}
