//! Storage Layer - SQLite-backed persistence
//!
//! System of record is a single SQLite table:
//! - notes(_id, code, name, latitude, longitude)
//!
//! `schema` owns table creation and version-gated recreation, `sqlite` owns
//! the open/close lifecycle, first-run seeding and CRUD.

pub mod schema;
pub mod sqlite;

pub use schema::{SchemaAction, DEFAULT_SCHEMA_VERSION};
pub use sqlite::{OpenReport, Store};
