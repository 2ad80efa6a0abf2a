//! Database schema definitions and version-gated recreation
//!
//! The stored schema version is SQLite's `PRAGMA user_version`. There is no
//! field-level migration: a lower stored version drops the table and all of
//! its records, then recreates it empty.

use crate::{Error, Result};
use rusqlite::Connection;
use serde::Serialize;

/// Table holding every record
pub const TABLE: &str = "notes";

/// Version written by this build when it creates the table
pub const DEFAULT_SCHEMA_VERSION: u32 = 3;

/// SQL to create the notes table.
/// Every editable column is unique on its own.
pub const CREATE_NOTES_TABLE: &str = r#"
CREATE TABLE notes (
    _id INTEGER PRIMARY KEY AUTOINCREMENT,
    code TEXT NOT NULL UNIQUE,
    name TEXT NOT NULL UNIQUE,
    latitude TEXT NOT NULL UNIQUE,
    longitude TEXT NOT NULL UNIQUE
)
"#;

/// SQL to drop the notes table
pub const DROP_NOTES_TABLE: &str = "DROP TABLE IF EXISTS notes";

/// What `ensure_schema` did to the table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "action", rename_all = "lowercase")]
pub enum SchemaAction {
    /// No table existed; an empty one was created
    Created { version: u32 },
    /// An older table was dropped with all its records and recreated empty
    Recreated { from: u32, to: u32 },
    /// The table already matched the expected version
    Unchanged { version: u32 },
}

impl std::fmt::Display for SchemaAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SchemaAction::Created { version } => write!(f, "created (version {})", version),
            SchemaAction::Recreated { from, to } => {
                write!(f, "recreated from version {} to {}, old records destroyed", from, to)
            }
            SchemaAction::Unchanged { version } => write!(f, "unchanged (version {})", version),
        }
    }
}

/// Read the stored schema version (0 for a fresh database)
pub fn stored_version(conn: &Connection) -> Result<u32> {
    let version: i64 = conn.pragma_query_value(None, "user_version", |row| row.get(0))?;
    u32::try_from(version)
        .map_err(|_| Error::Config(format!("stored schema version {} is out of range", version)))
}

fn table_exists(conn: &Connection) -> Result<bool> {
    let count: i64 = conn.query_row(
        "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = ?1",
        [TABLE],
        |row| row.get(0),
    )?;
    Ok(count > 0)
}

/// Guarantee a notes table at `expected` version exists.
///
/// Runs in one transaction. A stored version above `expected` is refused.
pub fn ensure_schema(conn: &mut Connection, expected: u32) -> Result<SchemaAction> {
    if expected == 0 {
        return Err(Error::Config("schema version must be at least 1".to_string()));
    }

    let tx = conn.transaction()?;
    let stored = stored_version(&tx)?;

    if stored > expected {
        return Err(Error::SchemaVersionAhead { stored, expected });
    }

    let action = if !table_exists(&tx)? {
        tracing::info!("Creating {} table at schema version {}", TABLE, expected);
        tx.execute(CREATE_NOTES_TABLE, [])?;
        SchemaAction::Created { version: expected }
    } else if stored < expected {
        tracing::warn!(
            "Upgrading database from version {} to {}, which will destroy all old data",
            stored,
            expected
        );
        tx.execute(DROP_NOTES_TABLE, [])?;
        tx.execute(CREATE_NOTES_TABLE, [])?;
        SchemaAction::Recreated { from: stored, to: expected }
    } else {
        SchemaAction::Unchanged { version: expected }
    };

    if stored != expected {
        tx.pragma_update(None, "user_version", expected)?;
    }
    tx.commit()?;

    Ok(action)
}
