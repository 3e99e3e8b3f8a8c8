use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::store::{Row, StoreError, TabularStore};

pub const TABLE: &str = "Users";
pub const COL_USERNAME: &str = "Username";
pub const COL_PASSWORD: &str = "Password";
pub const COL_ROLE: &str = "Role";
pub const COL_LEVEL: &str = "Level";
pub const COL_XP: &str = "XP";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Role {
    Member,
    Admin,
}

/// One row of the Users table. Accounts are seeded out-of-band; this core
/// only ever mutates Level, XP and Password.
#[derive(Debug, Clone, Serialize)]
pub struct User {
    pub username: String,
    #[serde(skip_serializing)]
    pub password: String,
    pub role: Role,
    pub level: u32,
    pub xp: u32,
}

#[derive(Clone)]
pub struct UserRepo {
    store: Arc<dyn TabularStore>,
}

fn cell(row: &Row, column: &str) -> String {
    row.get(column).cloned().unwrap_or_default()
}

/// The sheet is hand-edited; tolerate junk in numeric cells rather than
/// refusing the whole account.
fn numeric_cell(row: &Row, column: &str, default: u32) -> u32 {
    let raw = cell(row, column);
    match raw.trim().parse::<u32>() {
        Ok(v) => v,
        Err(_) => {
            if !raw.trim().is_empty() {
                warn!(column, value = %raw, "non-numeric cell, using default");
            }
            default
        }
    }
}

impl User {
    fn from_row(row: &Row) -> Self {
        let role = match cell(row, COL_ROLE).trim() {
            "Admin" => Role::Admin,
            _ => Role::Member,
        };
        Self {
            username: cell(row, COL_USERNAME),
            password: cell(row, COL_PASSWORD),
            role,
            level: numeric_cell(row, COL_LEVEL, 1).max(1),
            xp: numeric_cell(row, COL_XP, 0),
        }
    }
}

impl UserRepo {
    pub fn new(store: Arc<dyn TabularStore>) -> Self {
        Self { store }
    }

    pub async fn find_by_username(&self, name: &str) -> Result<Option<User>, StoreError> {
        let rows = self.store.fetch_rows(TABLE).await?;
        Ok(rows
            .iter()
            .find(|r| r.get(COL_USERNAME).map(String::as_str) == Some(name))
            .map(User::from_row))
    }

    pub async fn all(&self) -> Result<Vec<User>, StoreError> {
        let rows = self.store.fetch_rows(TABLE).await?;
        Ok(rows.iter().map(User::from_row).collect())
    }

    /// Write a single cell of a user's row, re-resolving the row by key and
    /// retrying exactly once if the locator went stale underneath us.
    async fn write_cell(&self, name: &str, column: &str, value: &str) -> Result<(), StoreError> {
        let mut retried = false;
        loop {
            let locator = self
                .store
                .find_row(TABLE, COL_USERNAME, name)
                .await?
                .ok_or_else(|| StoreError::RowNotFound {
                    table: TABLE.to_string(),
                    key_column: COL_USERNAME.to_string(),
                    key_value: name.to_string(),
                })?;
            match self.store.update_cell(TABLE, locator, column, value).await {
                Err(StoreError::StaleLocator(row)) if !retried => {
                    warn!(user = name, row, column, "stale locator, re-resolving");
                    retried = true;
                }
                other => return other,
            }
        }
    }

    /// Persist a progression step. The store has no multi-cell transaction,
    /// so the two writes are sequential with XP strictly first: a crash in
    /// between leaves XP ahead of level, and the loader treats that as
    /// "reward already granted". Level must never land without its XP.
    pub async fn update_level_and_xp(
        &self,
        name: &str,
        level: u32,
        xp: u32,
    ) -> Result<(), StoreError> {
        self.write_cell(name, COL_XP, &xp.to_string()).await?;
        self.write_cell(name, COL_LEVEL, &level.to_string()).await
    }

    pub async fn update_password(&self, name: &str, secret: &str) -> Result<(), StoreError> {
        self.write_cell(name, COL_PASSWORD, secret).await
    }
}
