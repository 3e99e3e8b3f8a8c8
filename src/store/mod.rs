use async_trait::async_trait;
use std::collections::BTreeMap;
use thiserror::Error;

pub mod memory;
pub mod rest;

pub use memory::MemoryStore;
pub use rest::RestStore;

/// One spreadsheet row, keyed by column header. Cells are strings because the
/// backing store is untyped; repos own the parsing.
pub type Row = BTreeMap<String, String>;

/// Opaque reference to a data row, 1-based and excluding the header row.
/// A locator is only valid until a concurrent writer deletes rows above it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RowLocator {
    pub row: u32,
}

#[derive(Debug, Error)]
pub enum StoreError {
    /// Transport or auth failure reaching the backing store. Retryable.
    #[error("store unavailable: {0}")]
    Unavailable(String),
    #[error("table not found: {0}")]
    TableNotFound(String),
    #[error("no row in {table} with {key_column} = {key_value}")]
    RowNotFound {
        table: String,
        key_column: String,
        key_value: String,
    },
    /// A previously resolved locator no longer points at a live row.
    #[error("row locator {0} no longer resolves")]
    StaleLocator(u32),
}

/// Typed access to the remote tabular store. The store offers no
/// transactions: a read-then-write through this trait is not atomic against
/// concurrent writers, and callers must tolerate lost-update races.
#[async_trait]
pub trait TabularStore: Send + Sync {
    /// Fetch every data row of a table. An empty table yields an empty Vec.
    async fn fetch_rows(&self, table: &str) -> Result<Vec<Row>, StoreError>;

    /// Append one row at the bottom of the table.
    async fn append_row(&self, table: &str, row: Row) -> Result<(), StoreError>;

    /// Locate the first row whose `key_column` cell equals `key_value`.
    async fn find_row(
        &self,
        table: &str,
        key_column: &str,
        key_value: &str,
    ) -> Result<Option<RowLocator>, StoreError>;

    /// Overwrite a single cell of a previously located row.
    async fn update_cell(
        &self,
        table: &str,
        locator: RowLocator,
        column: &str,
        value: &str,
    ) -> Result<(), StoreError>;
}

pub fn row(cells: &[(&str, &str)]) -> Row {
    cells
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}
