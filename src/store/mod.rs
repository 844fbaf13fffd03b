//! SQLite record store.
//!
//! One table, one row per tracked file:
//! - id: surrogate key
//! - path: canonical absolute path as raw OS bytes, unique
//! - fingerprint: content digest at the last write
//! - modified_at: mtime in epoch seconds at the last write
//!
//! Every mutation runs in its own transaction, so an interrupted scan leaves
//! only whole rows behind. Rows are never deleted.

pub mod schema;

use std::path::{Path, PathBuf};
use std::time::Duration;

use rusqlite::types::{FromSqlError, ValueRef};
use rusqlite::{params, Connection, OptionalExtension};
use serde::{Serialize, Serializer};

use crate::error::StoreError;
pub use schema::{SchemaStatus, DEFAULT_TABLE};

const BUSY_TIMEOUT: Duration = Duration::from_secs(2);

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TrackedFile {
    #[serde(serialize_with = "serialize_path")]
    pub path: PathBuf,
    pub fingerprint: String,
    /// `None` when the file vanished before its mtime could be read.
    pub modified_at: Option<i64>,
}

/// Database handle. Open once per run, reuse across all operations.
pub struct Store {
    conn: Connection,
    table: String,
    location: PathBuf,
}

impl Store {
    pub fn open(db_path: &Path, table: &str) -> Result<Self, StoreError> {
        schema::validate_table_name(table)?;

        let open_err = |source| StoreError::Open {
            path: db_path.to_path_buf(),
            source,
        };

        let conn = Connection::open(db_path).map_err(open_err)?;
        conn.busy_timeout(BUSY_TIMEOUT).map_err(open_err)?;

        // sqlite opens lazily, touch the file now so a bad path or a
        // non-database file fails here rather than mid-scan
        conn.query_row("SELECT COUNT(*) FROM sqlite_master", [], |row| {
            row.get::<_, i64>(0)
        })
        .map_err(open_err)?;

        tracing::debug!("opened record store {}", db_path.display());

        Ok(Store {
            conn,
            table: table.to_string(),
            location: db_path.to_path_buf(),
        })
    }

    pub fn open_in_memory(table: &str) -> Result<Self, StoreError> {
        schema::validate_table_name(table)?;

        let location = PathBuf::from(":memory:");
        let conn = Connection::open_in_memory().map_err(|source| StoreError::Open {
            path: location.clone(),
            source,
        })?;

        Ok(Store {
            conn,
            table: table.to_string(),
            location,
        })
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    pub fn location(&self) -> &Path {
        &self.location
    }

    pub fn table_exists(&self) -> Result<bool, StoreError> {
        schema::table_exists(&self.conn, &self.table)
    }

    pub fn ensure_schema(&mut self) -> Result<SchemaStatus, StoreError> {
        schema::ensure_schema(&mut self.conn, &self.table)
    }

    pub fn exists(&self, path: &Path) -> Result<bool, StoreError> {
        let count: i64 = self.conn.query_row(
            &format!("SELECT COUNT(*) FROM {} WHERE path = ?1", self.table),
            params![path_key(path)?],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }

    pub fn lookup(&self, path: &Path) -> Result<Option<TrackedFile>, StoreError> {
        let mut stmt = self.conn.prepare_cached(&format!(
            "SELECT path, fingerprint, modified_at FROM {} WHERE path = ?1",
            self.table
        ))?;

        let record = stmt
            .query_row(params![path_key(path)?], tracked_file_from_row)
            .optional()?;

        Ok(record)
    }

    /// Adds a row for a path that has none yet.
    ///
    /// A second insert for the same path is an `Integrity` error; callers pick
    /// insert or update from `lookup`/`exists`.
    pub fn insert(
        &mut self,
        path: &Path,
        fingerprint: &str,
        modified_at: Option<i64>,
    ) -> Result<(), StoreError> {
        let key = path_key(path)?;
        let tx = self.conn.transaction()?;
        tx.execute(
            &format!(
                "INSERT INTO {} (path, fingerprint, modified_at) VALUES (?1, ?2, ?3)",
                self.table
            ),
            params![key, fingerprint, modified_at],
        )?;
        tx.commit()?;
        Ok(())
    }

    /// Replaces fingerprint and mtime of an existing row.
    ///
    /// Returns false when no row matched, which means the caller skipped the
    /// existence check.
    pub fn update(
        &mut self,
        path: &Path,
        fingerprint: &str,
        modified_at: Option<i64>,
    ) -> Result<bool, StoreError> {
        let key = path_key(path)?;
        let tx = self.conn.transaction()?;
        let changed = tx.execute(
            &format!(
                "UPDATE {} SET fingerprint = ?1, modified_at = ?2 WHERE path = ?3",
                self.table
            ),
            params![fingerprint, modified_at, key],
        )?;
        tx.commit()?;
        Ok(changed > 0)
    }

    /// All records ordered by path.
    pub fn list(&self) -> Result<Vec<TrackedFile>, StoreError> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT path, fingerprint, modified_at FROM {} ORDER BY path",
            self.table
        ))?;

        let records = stmt
            .query_map([], tracked_file_from_row)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(records)
    }

    pub fn count(&self) -> Result<u64, StoreError> {
        let count: i64 = self.conn.query_row(
            &format!("SELECT COUNT(*) FROM {}", self.table),
            [],
            |row| row.get(0),
        )?;
        Ok(count.max(0) as u64)
    }
}

/// Paths are keyed by their raw bytes so that distinct non-UTF-8 names never
/// collapse into one row.
#[cfg(unix)]
fn path_key(path: &Path) -> Result<Vec<u8>, StoreError> {
    use std::os::unix::ffi::OsStrExt;
    Ok(path.as_os_str().as_bytes().to_vec())
}

#[cfg(unix)]
fn path_from_key(key: &[u8]) -> PathBuf {
    use std::os::unix::ffi::OsStrExt;
    PathBuf::from(std::ffi::OsStr::from_bytes(key))
}

#[cfg(not(unix))]
fn path_key(path: &Path) -> Result<Vec<u8>, StoreError> {
    path.to_str()
        .map(|s| s.as_bytes().to_vec())
        .ok_or_else(|| {
            StoreError::Operational(format!("{} is not valid unicode", path.display()))
        })
}

#[cfg(not(unix))]
fn path_from_key(key: &[u8]) -> PathBuf {
    PathBuf::from(String::from_utf8_lossy(key).into_owned())
}

fn tracked_file_from_row(row: &rusqlite::Row) -> rusqlite::Result<TrackedFile> {
    // tables created by other tools may store the path as TEXT
    let path = match row.get_ref(0)? {
        ValueRef::Blob(bytes) | ValueRef::Text(bytes) => path_from_key(bytes),
        other => {
            return Err(rusqlite::Error::FromSqlConversionFailure(
                0,
                other.data_type(),
                Box::new(FromSqlError::InvalidType),
            ))
        }
    };

    Ok(TrackedFile {
        path,
        fingerprint: row.get(1)?,
        modified_at: row.get(2)?,
    })
}

/// JSON has no byte strings, so paths are written as their display form.
pub(crate) fn serialize_path<S>(path: &Path, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.collect_str(&path.display())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> Store {
        let mut store = Store::open_in_memory("files").unwrap();
        store.ensure_schema().unwrap();
        store
    }

    #[test]
    fn lookup_of_unknown_path_is_none() {
        let store = store();
        assert_eq!(store.lookup(Path::new("/nope")).unwrap(), None);
        assert!(!store.exists(Path::new("/nope")).unwrap());
    }

    #[test]
    fn insert_then_lookup() {
        let mut store = store();
        let path = Path::new("/data/file1.txt");

        store.insert(path, "abc123", Some(1_700_000_000)).unwrap();

        assert!(store.exists(path).unwrap());
        assert_eq!(
            store.lookup(path).unwrap(),
            Some(TrackedFile {
                path: path.to_path_buf(),
                fingerprint: "abc123".to_string(),
                modified_at: Some(1_700_000_000),
            })
        );
    }

    #[test]
    fn duplicate_insert_is_integrity_conflict() {
        let mut store = store();
        let path = Path::new("/data/file1.txt");

        store.insert(path, "first", Some(1)).unwrap();
        let err = store.insert(path, "second", Some(2)).unwrap_err();

        assert!(matches!(err, StoreError::Integrity(_)));
        assert!(!err.is_fatal());
        // the failed transaction left the original row alone
        assert_eq!(store.lookup(path).unwrap().unwrap().fingerprint, "first");
        assert_eq!(store.count().unwrap(), 1);
    }

    #[test]
    fn update_replaces_fingerprint_and_mtime() {
        let mut store = store();
        let path = Path::new("/data/file1.txt");

        store.insert(path, "old", Some(10)).unwrap();
        assert!(store.update(path, "new", Some(20)).unwrap());

        let record = store.lookup(path).unwrap().unwrap();
        assert_eq!(record.fingerprint, "new");
        assert_eq!(record.modified_at, Some(20));
    }

    #[test]
    fn update_of_unknown_path_changes_nothing() {
        let mut store = store();
        assert!(!store.update(Path::new("/ghost"), "x", None).unwrap());
        assert_eq!(store.count().unwrap(), 0);
    }

    #[test]
    fn list_is_sorted_by_path() {
        let mut store = store();
        store.insert(Path::new("/b"), "2", None).unwrap();
        store.insert(Path::new("/a"), "1", Some(5)).unwrap();

        let paths: Vec<PathBuf> = store.list().unwrap().into_iter().map(|r| r.path).collect();
        assert_eq!(paths, vec![PathBuf::from("/a"), PathBuf::from("/b")]);
    }

    #[cfg(unix)]
    #[test]
    fn non_utf8_paths_keep_separate_rows() {
        use std::ffi::OsStr;
        use std::os::unix::ffi::OsStrExt;

        let mut store = store();
        let ff = Path::new(OsStr::from_bytes(b"/data/a\xff.txt"));
        let fe = Path::new(OsStr::from_bytes(b"/data/a\xfe.txt"));

        store.insert(ff, "one", Some(1)).unwrap();
        store.insert(fe, "two", Some(2)).unwrap();

        assert_eq!(store.count().unwrap(), 2);
        assert_eq!(store.lookup(ff).unwrap().unwrap().fingerprint, "one");
        assert_eq!(store.lookup(fe).unwrap().unwrap().fingerprint, "two");

        let paths: Vec<PathBuf> = store.list().unwrap().into_iter().map(|r| r.path).collect();
        assert_eq!(paths, vec![fe.to_path_buf(), ff.to_path_buf()]);
    }

    #[test]
    fn operations_before_bootstrap_are_operational_errors() {
        let store = Store::open_in_memory("status").unwrap();
        assert!(!store.table_exists().unwrap());

        let err = store.lookup(Path::new("/a")).unwrap_err();
        assert!(matches!(err, StoreError::Operational(_)));
    }

    #[test]
    fn open_rejects_bad_table_name() {
        let dir = tempfile::tempdir().unwrap();
        let result = Store::open(&dir.path().join("x.db"), "bad name");
        assert!(matches!(result, Err(StoreError::InvalidTableName(_))));
    }

    #[test]
    fn open_of_non_database_file_fails() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("not-a.db");
        std::fs::write(&path, vec![b'x'; 4096]).unwrap();

        let err = Store::open(&path, DEFAULT_TABLE).err().unwrap();
        assert!(matches!(err, StoreError::Open { .. }));
        assert!(err.is_fatal());
    }

    #[test]
    fn records_survive_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let db = dir.path().join("changes.db");

        {
            let mut store = Store::open(&db, DEFAULT_TABLE).unwrap();
            assert_eq!(store.ensure_schema().unwrap(), SchemaStatus::Created);
            store.insert(Path::new("/x"), "digest", Some(3)).unwrap();
        }

        let mut store = Store::open(&db, DEFAULT_TABLE).unwrap();
        assert_eq!(store.ensure_schema().unwrap(), SchemaStatus::AlreadyExists);
        assert_eq!(store.lookup(Path::new("/x")).unwrap().unwrap().fingerprint, "digest");
    }
}
