//! # UDBuildings - building location store
//!
//! Embedded, versioned record store for a small set of building locations.
//!
//! UDBuildings provides:
//! - A single SQLite table of records (code, name, latitude, longitude)
//! - Four independent uniqueness constraints, reported as typed errors
//! - Version-gated "drop and recreate" schema upgrades
//! - One-time seeding from a `:`-delimited flat file when the store is empty

pub mod record;
pub mod seed;
pub mod storage;
pub mod config;
pub mod ui;

// Re-exports for convenient access
pub use record::{NewRecord, Record, UniqueField};
pub use seed::{NoSeed, SeedFile, SeedReader, SeedSource};
pub use storage::{OpenReport, SchemaAction, Store};

use std::path::PathBuf;

/// Result type alias for store operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for store operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Storage unavailable at {}: {source}", .path.display())]
    StorageUnavailable {
        path: PathBuf,
        #[source]
        source: rusqlite::Error,
    },

    #[error("Constraint violation: {detail}")]
    ConstraintViolation {
        field: Option<UniqueField>,
        detail: String,
    },

    #[error("Record not found: {0}")]
    NotFound(i64),

    #[error("Seed parse error on line {line}: {reason}")]
    SeedParse { line: usize, reason: String },

    #[error("Stored schema version {stored} is newer than expected version {expected}")]
    SchemaVersionAhead { stored: u32, expected: u32 },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Storage error: {0}")]
    Storage(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Classify a rusqlite failure, splitting out uniqueness violations
    pub(crate) fn from_sqlite(err: rusqlite::Error) -> Self {
        match err {
            rusqlite::Error::SqliteFailure(code, msg)
                if code.code == rusqlite::ErrorCode::ConstraintViolation =>
            {
                let detail = msg.unwrap_or_else(|| code.to_string());
                let field = detail
                    .rsplit('.')
                    .next()
                    .and_then(|column| column.trim().parse().ok());
                Error::ConstraintViolation { field, detail }
            }
            other => Error::Storage(other),
        }
    }

    /// True for uniqueness violations
    pub fn is_constraint_violation(&self) -> bool {
        matches!(self, Error::ConstraintViolation { .. })
    }
}
