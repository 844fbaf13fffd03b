//! Error taxonomy.
//!
//! Each concern gets its own enum so callers decide per kind whether to
//! propagate, skip or ignore:
//! - `ConfigError`: the scan cannot start
//! - `FingerprintError`: one file is unreadable, skip it
//! - `StoreError`: integrity conflicts and operational failures are per-file,
//!   fatal ones end the process
//! - `ScanError`: the only way `scan_once` aborts

use std::path::PathBuf;

use rusqlite::ErrorCode;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("configuration file {} not found", path.display())]
    NotFound { path: PathBuf },

    #[error("failed to read configuration file {}: {source}", path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("{}:{line}: {reason}", path.display())]
    Parse {
        path: PathBuf,
        line: usize,
        reason: ParseReason,
    },

    #[error("could not determine a data directory for the record store")]
    NoDataDir,

    #[error("failed to create directory {}: {source}", path.display())]
    CreateDir {
        path: PathBuf,
        source: std::io::Error,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseReason {
    #[error("too many separators ({0} '|' characters, at most 1 allowed)")]
    TooManySeparators(usize),

    #[error("missing directory before '|'")]
    MissingDirectory,

    #[error("{found} style directory {dir:?} cannot be mixed with {expected} style directories")]
    MixedStyle {
        dir: String,
        found: &'static str,
        expected: &'static str,
    },
}

#[derive(Debug, Error)]
pub enum FingerprintError {
    #[error("cannot read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("cannot open record store {}: {source}", path.display())]
    Open {
        path: PathBuf,
        source: rusqlite::Error,
    },

    /// Constraint violation, usually a duplicate insert.
    #[error("integrity conflict: {0}")]
    Integrity(String),

    #[error("store operation failed: {0}")]
    Operational(String),

    /// The database file is unreachable or damaged.
    #[error("record store is unusable: {0}")]
    Fatal(String),

    #[error("invalid table name {0:?}: expected letters, digits and underscores")]
    InvalidTableName(String),
}

impl StoreError {
    pub fn is_fatal(&self) -> bool {
        matches!(self, StoreError::Open { .. } | StoreError::Fatal(_))
    }
}

impl From<rusqlite::Error> for StoreError {
    fn from(err: rusqlite::Error) -> Self {
        let code = match &err {
            rusqlite::Error::SqliteFailure(ffi, _) => Some(ffi.code),
            _ => None,
        };

        match code {
            Some(ErrorCode::ConstraintViolation) => StoreError::Integrity(err.to_string()),
            Some(
                ErrorCode::CannotOpen
                | ErrorCode::NotADatabase
                | ErrorCode::DatabaseCorrupt
                | ErrorCode::SystemIoFailure
                | ErrorCode::PermissionDenied
                | ErrorCode::DiskFull,
            ) => StoreError::Fatal(err.to_string()),
            _ => StoreError::Operational(err.to_string()),
        }
    }
}

#[derive(Debug, Error)]
pub enum ScanError {
    #[error(transparent)]
    Store(#[from] StoreError),

    /// Stat failed for a reason other than the file disappearing.
    #[error("cannot stat {}: {source}", path.display())]
    Stat {
        path: PathBuf,
        source: std::io::Error,
    },
}
