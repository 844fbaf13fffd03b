//! Table bootstrap for the record store.

use rusqlite::{params, Connection};
use serde::Serialize;

use crate::error::StoreError;

pub const DEFAULT_TABLE: &str = "status";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SchemaStatus {
    Created,
    AlreadyExists,
}

/// Table names are interpolated into SQL, so only plain identifiers pass.
pub fn validate_table_name(name: &str) -> Result<(), StoreError> {
    let mut chars = name.chars();
    let valid = match chars.next() {
        Some(first) => {
            (first.is_ascii_alphabetic() || first == '_')
                && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        }
        None => false,
    };

    if valid && !name.to_ascii_lowercase().starts_with("sqlite_") {
        Ok(())
    } else {
        Err(StoreError::InvalidTableName(name.to_string()))
    }
}

pub fn table_exists(conn: &Connection, table: &str) -> Result<bool, StoreError> {
    let count: i64 = conn.query_row(
        "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = ?1",
        params![table],
        |row| row.get(0),
    )?;
    Ok(count > 0)
}

fn path_index_exists(conn: &Connection, table: &str) -> Result<bool, StoreError> {
    let count: i64 = conn.query_row(
        "SELECT COUNT(*) FROM sqlite_master WHERE type = 'index' AND name = ?1",
        params![path_index_name(table)],
        |row| row.get(0),
    )?;
    Ok(count > 0)
}

fn path_index_name(table: &str) -> String {
    format!("idx_{table}_path")
}

/// Creates `table` and its unique path index in one transaction.
///
/// A second call finds the table and reports `AlreadyExists`, adding the
/// unique path index only if it is missing. Losing a creation race to another
/// process is reported the same way.
pub fn ensure_schema(conn: &mut Connection, table: &str) -> Result<SchemaStatus, StoreError> {
    validate_table_name(table)?;

    if table_exists(conn, table)? {
        tracing::debug!("table \"{table}\" already exists");
        if !path_index_exists(conn, table)? {
            tracing::info!("adding missing unique path index to \"{table}\"");
            conn.execute(
                &format!(
                    "CREATE UNIQUE INDEX IF NOT EXISTS {} ON {table} (path)",
                    path_index_name(table)
                ),
                [],
            )?;
        }
        return Ok(SchemaStatus::AlreadyExists);
    }

    match create_table(conn, table) {
        Ok(()) => {
            tracing::debug!("created table \"{table}\" with unique index on path");
            Ok(SchemaStatus::Created)
        }
        Err(e) if e.to_string().contains("already exists") => {
            tracing::debug!("{e}");
            Ok(SchemaStatus::AlreadyExists)
        }
        Err(e) => Err(e.into()),
    }
}

fn create_table(conn: &mut Connection, table: &str) -> rusqlite::Result<()> {
    let tx = conn.transaction()?;
    tx.execute(
        &format!(
            "CREATE TABLE {table} (
                id INTEGER PRIMARY KEY,
                path BLOB NOT NULL,
                fingerprint TEXT NOT NULL,
                modified_at INTEGER
            )"
        ),
        [],
    )?;
    tx.execute(
        &format!(
            "CREATE UNIQUE INDEX {} ON {table} (path)",
            path_index_name(table)
        ),
        [],
    )?;
    tx.commit()
}
