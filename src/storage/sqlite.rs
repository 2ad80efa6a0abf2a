//! SQLite storage implementation

use std::path::{Path, PathBuf};
use rusqlite::{Connection, ErrorCode, OptionalExtension, params};
use serde::Serialize;
use crate::{Error, Result};
use crate::record::{NewRecord, Record};
use crate::seed::SeedSource;
use super::schema::{self, SchemaAction};

const SELECT_COLUMNS: &str = "SELECT _id, code, name, latitude, longitude FROM notes";

/// What happened while opening a store
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct OpenReport {
    pub schema: SchemaAction,
    /// Records inserted from the seed source (0 when the table was not empty)
    pub seeded: usize,
}

impl std::fmt::Display for OpenReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Open Report:")?;
        writeln!(f, "  Schema: {}", self.schema)?;
        writeln!(f, "  Seeded: {}", self.seeded)
    }
}

/// SQLite-backed building store.
///
/// An open `Store` owns its connection exclusively. Dropping it or calling
/// [`Store::close`] releases the connection. The connection is not `Sync`,
/// so callers sharing a store across threads must wrap it in a lock.
pub struct Store {
    conn: Connection,
    report: OpenReport,
}

impl Store {
    /// Open a database file (creates if doesn't exist), then seed it if empty
    pub fn open<S: SeedSource>(path: &Path, schema_version: u32, seed: S) -> Result<Self> {
        let conn = Connection::open(path).map_err(|source| Error::StorageUnavailable {
            path: path.to_path_buf(),
            source,
        })?;
        Self::initialize(conn, schema_version, seed).map_err(|err| match err {
            Error::Storage(source) if source.sqlite_error_code() == Some(ErrorCode::NotADatabase) => {
                Error::StorageUnavailable { path: path.to_path_buf(), source }
            }
            other => other,
        })
    }

    /// Open an in-memory database (for testing)
    pub fn open_in_memory<S: SeedSource>(schema_version: u32, seed: S) -> Result<Self> {
        let conn = Connection::open_in_memory().map_err(|source| Error::StorageUnavailable {
            path: PathBuf::from(":memory:"),
            source,
        })?;
        Self::initialize(conn, schema_version, seed)
    }

    /// Materialize the schema and seed an empty table.
    ///
    /// On error `conn` is dropped here, so a failed open never leaks a handle.
    fn initialize<S: SeedSource>(mut conn: Connection, schema_version: u32, seed: S) -> Result<Self> {
        let schema = schema::ensure_schema(&mut conn, schema_version)?;

        let seeded = if count_rows(&conn)? == 0 {
            seed_table(&mut conn, seed)?
        } else {
            tracing::debug!("Table not empty, skipping seeding");
            0
        };

        Ok(Self {
            conn,
            report: OpenReport { schema, seeded },
        })
    }

    /// Release the connection
    pub fn close(self) -> Result<()> {
        self.conn.close().map_err(|(_, err)| Error::Storage(err))
    }

    /// What `open` did to the schema and how many records it seeded
    pub fn last_open(&self) -> &OpenReport {
        &self.report
    }

    /// Schema version currently stored in the database
    pub fn schema_version(&self) -> Result<u32> {
        schema::stored_version(&self.conn)
    }

    // ========== Record Operations ==========

    /// Insert a new record and return its identifier
    pub fn create_note(&self, code: &str, name: &str, latitude: &str, longitude: &str) -> Result<i64> {
        let id = insert_record(&self.conn, &NewRecord::new(code, name, latitude, longitude))?;
        tracing::debug!("Created record {} ({})", id, code);
        Ok(id)
    }

    /// Delete the record with the given identifier.
    /// Returns false when no such record exists.
    pub fn delete_note(&self, id: i64) -> Result<bool> {
        let deleted = self.conn.execute("DELETE FROM notes WHERE _id = ?1", [id])?;
        tracing::debug!("Delete record {}: {} row(s)", id, deleted);
        Ok(deleted > 0)
    }

    /// Get all records in insertion order
    pub fn fetch_all_notes(&self) -> Result<Vec<Record>> {
        let mut stmt = self.conn.prepare(&format!("{} ORDER BY _id", SELECT_COLUMNS))?;

        let records = stmt
            .query_map([], row_to_record)?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok(records)
    }

    /// Get a record by identifier
    pub fn fetch_note(&self, id: i64) -> Result<Record> {
        self.conn
            .query_row(&format!("{} WHERE _id = ?1", SELECT_COLUMNS), [id], row_to_record)
            .optional()?
            .ok_or(Error::NotFound(id))
    }

    /// Replace all four fields of a record.
    /// Returns false when no such record exists.
    pub fn update_note(
        &self,
        id: i64,
        code: &str,
        name: &str,
        latitude: &str,
        longitude: &str,
    ) -> Result<bool> {
        let updated = self
            .conn
            .execute(
                r#"
                UPDATE notes SET code = ?1, name = ?2, latitude = ?3, longitude = ?4
                WHERE _id = ?5
                "#,
                params![code, name, latitude, longitude, id],
            )
            .map_err(Error::from_sqlite)?;
        tracing::debug!("Update record {}: {} row(s)", id, updated);
        Ok(updated > 0)
    }

    /// Count all records
    pub fn count_notes(&self) -> Result<usize> {
        count_rows(&self.conn)
    }
}

fn count_rows(conn: &Connection) -> Result<usize> {
    let count: i64 = conn.query_row("SELECT COUNT(*) FROM notes", [], |row| row.get(0))?;
    Ok(count as usize)
}

fn insert_record(conn: &Connection, record: &NewRecord) -> Result<i64> {
    conn.execute(
        "INSERT INTO notes (code, name, latitude, longitude) VALUES (?1, ?2, ?3, ?4)",
        params![record.code, record.name, record.latitude, record.longitude],
    )
    .map_err(Error::from_sqlite)?;
    Ok(conn.last_insert_rowid())
}

/// Drain `seed` into the table inside one transaction.
///
/// The first failing record aborts the pass and nothing is committed.
fn seed_table<S: SeedSource>(conn: &mut Connection, seed: S) -> Result<usize> {
    let tx = conn.transaction()?;
    let mut seeded = 0;

    let outcome = seed.records().and_then(|records| {
        for record in records {
            insert_record(&tx, &record?)?;
            seeded += 1;
        }
        Ok(())
    });

    if let Err(err) = outcome {
        tracing::error!("Seeding aborted after {} record(s), rolling back: {}", seeded, err);
        return Err(err);
    }

    tx.commit()?;
    if seeded > 0 {
        tracing::info!("Seeded {} record(s)", seeded);
    }
    Ok(seeded)
}

fn row_to_record(row: &rusqlite::Row) -> rusqlite::Result<Record> {
    Ok(Record {
        id: row.get(0)?,
        code: row.get(1)?,
        name: row.get(2)?,
        latitude: row.get(3)?,
        longitude: row.get(4)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::UniqueField;
    use crate::seed::{NoSeed, SeedFile, SeedReader};
    use std::io::Cursor;

    const VERSION: u32 = schema::DEFAULT_SCHEMA_VERSION;

    fn empty_store() -> Store {
        Store::open_in_memory(VERSION, NoSeed).unwrap()
    }

    fn sample(n: usize) -> NewRecord {
        NewRecord::new(
            format!("C{n}"),
            format!("Building {n}"),
            format!("{n}.5"),
            format!("-{n}.5"),
        )
    }

    fn create(store: &Store, r: &NewRecord) -> Result<i64> {
        store.create_note(&r.code, &r.name, &r.latitude, &r.longitude)
    }

    #[test]
    fn test_create_then_fetch_all_in_order() {
        let store = empty_store();
        let inputs: Vec<NewRecord> = (1..=5).map(sample).collect();

        let ids: Vec<i64> = inputs.iter().map(|r| create(&store, r).unwrap()).collect();
        assert!(ids[0] > 0);
        assert!(ids.windows(2).all(|w| w[0] < w[1]));

        let all = store.fetch_all_notes().unwrap();
        assert_eq!(all.len(), inputs.len());
        for ((record, input), id) in all.iter().zip(&inputs).zip(&ids) {
            assert_eq!(record.id, *id);
            assert_eq!(&record.fields(), input);
        }
    }

    #[test]
    fn test_create_duplicate_field_is_constraint_violation() {
        let store = empty_store();
        let original = sample(1);
        let id = create(&store, &original).unwrap();

        for field in UniqueField::all() {
            let mut dup = sample(2);
            match field {
                UniqueField::Code => dup.code = original.code.clone(),
                UniqueField::Name => dup.name = original.name.clone(),
                UniqueField::Latitude => dup.latitude = original.latitude.clone(),
                UniqueField::Longitude => dup.longitude = original.longitude.clone(),
            }
            match create(&store, &dup).unwrap_err() {
                Error::ConstraintViolation { field: violated, .. } => {
                    assert_eq!(violated, Some(*field))
                }
                other => panic!("unexpected error: {other}"),
            }
        }

        assert_eq!(store.count_notes().unwrap(), 1);
        assert_eq!(store.fetch_note(id).unwrap().fields(), original);
    }

    #[test]
    fn test_delete_unknown_and_known() {
        let store = empty_store();
        let a = create(&store, &sample(1)).unwrap();
        let b = create(&store, &sample(2)).unwrap();

        assert!(!store.delete_note(b + 100).unwrap());
        assert_eq!(store.count_notes().unwrap(), 2);

        assert!(store.delete_note(a).unwrap());
        let remaining = store.fetch_all_notes().unwrap();
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].id, b);
        assert!(!store.delete_note(a).unwrap());
    }

    #[test]
    fn test_fetch_missing_is_not_found() {
        let store = empty_store();
        assert!(matches!(store.fetch_note(42), Err(Error::NotFound(42))));
    }

    #[test]
    fn test_update_replaces_all_fields() {
        let store = empty_store();
        let id = create(&store, &sample(1)).unwrap();
        create(&store, &sample(2)).unwrap();

        assert!(store.update_note(id, "Z9", "Library", "50.1", "60.2").unwrap());
        let record = store.fetch_note(id).unwrap();
        assert_eq!(record.id, id);
        assert_eq!(record.fields(), NewRecord::new("Z9", "Library", "50.1", "60.2"));
    }

    #[test]
    fn test_update_to_own_values_is_allowed() {
        let store = empty_store();
        let r = sample(1);
        let id = create(&store, &r).unwrap();
        assert!(store.update_note(id, &r.code, &r.name, &r.latitude, &r.longitude).unwrap());
    }

    #[test]
    fn test_update_collision_keeps_prior_values() {
        let store = empty_store();
        let id = create(&store, &sample(1)).unwrap();
        let other = sample(2);
        create(&store, &other).unwrap();

        let err = store
            .update_note(id, "fresh", &other.name, "0.0", "0.0")
            .unwrap_err();
        assert!(err.is_constraint_violation());
        assert_eq!(store.fetch_note(id).unwrap().fields(), sample(1));
    }

    #[test]
    fn test_update_collision_on_each_field_is_reported() {
        let store = empty_store();
        let id = create(&store, &sample(1)).unwrap();
        let other = sample(2);
        create(&store, &other).unwrap();

        for field in UniqueField::all() {
            let mut target = sample(3);
            match field {
                UniqueField::Code => target.code = other.code.clone(),
                UniqueField::Name => target.name = other.name.clone(),
                UniqueField::Latitude => target.latitude = other.latitude.clone(),
                UniqueField::Longitude => target.longitude = other.longitude.clone(),
            }
            let err = store
                .update_note(id, &target.code, &target.name, &target.latitude, &target.longitude)
                .unwrap_err();
            match err {
                Error::ConstraintViolation { field: violated, .. } => {
                    assert_eq!(violated, Some(*field))
                }
                other => panic!("unexpected error: {other}"),
            }
            assert_eq!(store.fetch_note(id).unwrap().fields(), sample(1));
        }
    }

    #[test]
    fn test_fetch_all_rereads_after_mutation() {
        let store = empty_store();
        let a = create(&store, &sample(1)).unwrap();
        create(&store, &sample(2)).unwrap();

        let first = store.fetch_all_notes().unwrap();
        assert_eq!(first.len(), 2);
        assert_eq!(store.fetch_all_notes().unwrap(), first);

        store.update_note(a, "Z9", "Library", "50.1", "60.2").unwrap();
        let c = create(&store, &sample(3)).unwrap();

        let second = store.fetch_all_notes().unwrap();
        assert_eq!(second.len(), 3);
        assert_eq!(second[0].fields(), NewRecord::new("Z9", "Library", "50.1", "60.2"));
        assert_eq!(second[1], first[1]);
        assert_eq!(second[2].id, c);
    }

    #[test]
    fn test_update_unknown_returns_false() {
        let store = empty_store();
        create(&store, &sample(1)).unwrap();
        assert!(!store.update_note(999, "X", "Y", "1", "2").unwrap());
        assert_eq!(store.fetch_all_notes().unwrap()[0].fields(), sample(1));
    }

    #[test]
    fn test_open_seeds_from_reader() {
        let seed = SeedReader::new(Cursor::new("A1:Tower:10.0:20.0\nA2:Hall:11.0:21.0\n"));
        let store = Store::open_in_memory(VERSION, seed).unwrap();

        let all = store.fetch_all_notes().unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].id, 1);
        assert_eq!(all[0].fields(), NewRecord::new("A1", "Tower", "10.0", "20.0"));
        assert_eq!(all[1].id, 2);
        assert_eq!(all[1].fields(), NewRecord::new("A2", "Hall", "11.0", "21.0"));
        assert_eq!(store.last_open().seeded, 2);
        assert_eq!(store.last_open().schema, SchemaAction::Created { version: VERSION });
    }

    #[test]
    fn test_reopen_does_not_reseed() {
        let dir = tempfile::tempdir().unwrap();
        let db = dir.path().join("buildings.db");
        let seed = dir.path().join("UDBuildingPositions");
        std::fs::write(&seed, "A1:Tower:10.0:20.0\nA2:Hall:11.0:21.0\n").unwrap();

        let store = Store::open(&db, VERSION, SeedFile::new(&seed)).unwrap();
        assert_eq!(store.count_notes().unwrap(), 2);
        store.close().unwrap();

        let store = Store::open(&db, VERSION, SeedFile::new(&seed)).unwrap();
        assert_eq!(store.count_notes().unwrap(), 2);
        assert_eq!(store.last_open().seeded, 0);
        assert_eq!(store.last_open().schema, SchemaAction::Unchanged { version: VERSION });
    }

    #[test]
    fn test_version_bump_wipes_records() {
        let dir = tempfile::tempdir().unwrap();
        let db = dir.path().join("buildings.db");

        let store = Store::open(&db, 2, NoSeed).unwrap();
        create(&store, &sample(1)).unwrap();
        store.close().unwrap();

        let store = Store::open(&db, 3, NoSeed).unwrap();
        assert!(store.fetch_all_notes().unwrap().is_empty());
        assert_eq!(store.schema_version().unwrap(), 3);
        assert_eq!(store.last_open().schema, SchemaAction::Recreated { from: 2, to: 3 });
    }

    #[test]
    fn test_version_bump_reseeds_empty_table() {
        let dir = tempfile::tempdir().unwrap();
        let db = dir.path().join("buildings.db");

        let store = Store::open(&db, 1, vec![sample(1)]).unwrap();
        create(&store, &sample(2)).unwrap();
        store.close().unwrap();

        let store = Store::open(&db, 2, vec![sample(3)]).unwrap();
        let all = store.fetch_all_notes().unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].fields(), sample(3));
    }

    #[test]
    fn test_older_code_refuses_newer_database() {
        let dir = tempfile::tempdir().unwrap();
        let db = dir.path().join("buildings.db");
        Store::open(&db, 4, NoSeed).unwrap().close().unwrap();

        let err = Store::open(&db, 3, NoSeed).err().unwrap();
        assert!(matches!(err, Error::SchemaVersionAhead { stored: 4, expected: 3 }));
    }

    #[test]
    fn test_malformed_seed_rolls_back_whole_pass() {
        let dir = tempfile::tempdir().unwrap();
        let db = dir.path().join("buildings.db");
        let seed = "A1:Tower:10.0:20.0\nA2:Hall\nA3:Annex:12.0:22.0\n";

        let err = Store::open(&db, VERSION, SeedReader::new(Cursor::new(seed))).err().unwrap();
        assert!(matches!(err, Error::SeedParse { line: 2, .. }));

        let store = Store::open(&db, VERSION, NoSeed).unwrap();
        assert_eq!(store.count_notes().unwrap(), 0);
    }

    #[test]
    fn test_invalid_utf8_seed_is_parse_failure() {
        let seed: &[u8] = b"A1:Tower:10.0:20.0\nA2:H\xffall:11.0:21.0\n";
        let err = Store::open_in_memory(VERSION, SeedReader::new(Cursor::new(seed)))
            .err()
            .unwrap();
        assert!(matches!(err, Error::SeedParse { line: 2, .. }));
    }

    #[test]
    fn test_duplicate_seed_is_constraint_violation() {
        let seed = vec![sample(1), sample(1)];
        let err = Store::open_in_memory(VERSION, seed).err().unwrap();
        assert!(err.is_constraint_violation());
    }

    #[test]
    fn test_failed_seed_then_retry_starts_at_first_id() {
        let dir = tempfile::tempdir().unwrap();
        let db = dir.path().join("buildings.db");
        assert!(Store::open(&db, VERSION, vec![sample(1), sample(1)]).is_err());

        let store = Store::open(&db, VERSION, vec![sample(1)]).unwrap();
        assert_eq!(store.fetch_all_notes().unwrap()[0].id, 1);
    }

    #[test]
    fn test_open_report_serializes() {
        let store = Store::open_in_memory(VERSION, vec![sample(1)]).unwrap();
        let json = serde_json::to_value(store.last_open()).unwrap();
        assert_eq!(json["seeded"], 1);
        assert_eq!(json["schema"]["action"], "created");
        assert_eq!(json["schema"]["version"], VERSION);
    }

    #[test]
    fn test_missing_seed_file_opens_empty() {
        let dir = tempfile::tempdir().unwrap();
        let db = dir.path().join("buildings.db");
        let store = Store::open(&db, VERSION, SeedFile::new(dir.path().join("absent"))).unwrap();
        assert_eq!(store.count_notes().unwrap(), 0);
        assert_eq!(store.last_open().seeded, 0);
    }

    #[test]
    fn test_unopenable_path_is_storage_unavailable() {
        let dir = tempfile::tempdir().unwrap();
        let db = dir.path().join("missing-dir").join("buildings.db");
        let err = Store::open(&db, VERSION, NoSeed).err().unwrap();
        assert!(matches!(err, Error::StorageUnavailable { .. }));
    }

    #[test]
    fn test_non_database_file_is_storage_unavailable() {
        let dir = tempfile::tempdir().unwrap();
        let db = dir.path().join("buildings.db");
        std::fs::write(&db, "not a sqlite database ".repeat(64)).unwrap();
        let err = Store::open(&db, VERSION, NoSeed).err().unwrap();
        assert!(matches!(err, Error::StorageUnavailable { .. }));
    }
}
