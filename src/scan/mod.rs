//! One pass over every configured directory.
//!
//! Each regular file is fingerprinted and compared with its stored record:
//! unknown paths are inserted, differing fingerprints are updated, matching
//! ones are left alone. Per-file failures are logged and tallied; only a
//! broken store or a failing stat aborts the pass.

pub mod counters;

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::time::Instant;

use serde::Serialize;
use walkdir::{DirEntry, WalkDir};

use crate::error::{ScanError, StoreError};
use crate::fingerprint::{file_extension, fingerprint, mod_time};
use crate::rules::ScanConfig;
use crate::store::Store;
pub use counters::ScanCounters;

/// What happened to a single walked entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum FileOutcome {
    Inserted,
    Updated,
    Unchanged,
    Excluded,
    /// Symlink, socket, fifo or device.
    NotRegular,
    /// Another writer inserted the row first.
    Conflict,
    Unreadable,
    StoreFailed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeKind {
    New,
    Modified,
}

impl ChangeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChangeKind::New => "new",
            ChangeKind::Modified => "modified",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileChange {
    #[serde(serialize_with = "crate::store::serialize_path")]
    pub path: PathBuf,
    pub kind: ChangeKind,
}

#[derive(Debug, Clone, Serialize)]
pub struct ScanOutcome {
    pub any_changed: bool,
    pub counters: ScanCounters,
    pub changes: Vec<FileChange>,
    pub duration_ms: u128,
}

impl ScanOutcome {
    pub fn empty() -> Self {
        ScanOutcome {
            any_changed: false,
            counters: ScanCounters::default(),
            changes: Vec::new(),
            duration_ms: 0,
        }
    }

    fn record(&mut self, path: &Path, outcome: FileOutcome) {
        self.counters.record(&outcome);

        let kind = match outcome {
            FileOutcome::Inserted => ChangeKind::New,
            FileOutcome::Updated => ChangeKind::Modified,
            _ => return,
        };

        self.any_changed = true;
        self.changes.push(FileChange {
            path: path.to_path_buf(),
            kind,
        });
    }
}

/// Scans every directory in `config` once, in sorted order.
pub fn scan_once(config: &ScanConfig, store: &mut Store) -> Result<ScanOutcome, ScanError> {
    let start = Instant::now();
    let mut outcome = ScanOutcome::empty();

    if config.is_empty() {
        tracing::debug!("no directories to scan");
    }

    let total = config.directories.len();
    for (i, rule) in config.directories.iter().enumerate() {
        tracing::debug!("processing directory {} of {total}: {}", i + 1, rule.path);
        let excluded = config.excluded_for(rule);
        scan_directory(Path::new(&rule.path), excluded, store, &mut outcome)?;
    }

    outcome.duration_ms = start.elapsed().as_millis();
    tracing::info!(
        "scan finished in {}ms: {} checked, {} changed, {} unchanged, {} skipped",
        outcome.duration_ms,
        outcome.counters.checked,
        outcome.counters.changed,
        outcome.counters.unchanged,
        outcome.counters.skipped
    );

    Ok(outcome)
}

fn scan_directory(
    dir: &Path,
    excluded: &BTreeSet<String>,
    store: &mut Store,
    outcome: &mut ScanOutcome,
) -> Result<(), ScanError> {
    outcome.counters.folders += 1;

    // directories come and go between config load and scan, a missing one is
    // simply empty
    let root = match dir.canonicalize() {
        Ok(root) => root,
        Err(e) => {
            tracing::debug!("skipping {}: {e}", dir.display());
            return Ok(());
        }
    };

    for entry in WalkDir::new(&root).follow_links(false) {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                tracing::debug!("walk error under {}: {e}", root.display());
                continue;
            }
        };

        if entry.file_type().is_dir() {
            continue;
        }

        outcome.counters.checked += 1;
        let file_outcome = check_entry(&entry, excluded, store)?;
        outcome.record(entry.path(), file_outcome);
    }

    Ok(())
}

fn check_entry(
    entry: &DirEntry,
    excluded: &BTreeSet<String>,
    store: &mut Store,
) -> Result<FileOutcome, ScanError> {
    let path = entry.path();

    if !entry.file_type().is_file() {
        tracing::debug!("skipping non-file {}", path.display());
        return Ok(FileOutcome::NotRegular);
    }

    let ext = file_extension(path);
    if !ext.is_empty() && excluded.contains(&ext) {
        tracing::debug!("skipping {} with excluded extension \"{ext}\"", path.display());
        return Ok(FileOutcome::Excluded);
    }

    check_file(path, store)
}

/// Compares one regular file with its record and writes if needed.
pub fn check_file(path: &Path, store: &mut Store) -> Result<FileOutcome, ScanError> {
    let existing = match store.lookup(path) {
        Ok(existing) => existing,
        Err(e) => return store_failure(path, e),
    };

    let current = match fingerprint(path) {
        Ok(digest) => digest,
        Err(e) => {
            tracing::warn!("{e}, skipping");
            return Ok(FileOutcome::Unreadable);
        }
    };

    match existing {
        None => {
            let modified_at = stat(path)?;
            match store.insert(path, &current, modified_at) {
                Ok(()) => {
                    tracing::debug!("new file {}", path.display());
                    Ok(FileOutcome::Inserted)
                }
                Err(StoreError::Integrity(msg)) => {
                    tracing::debug!("{} already recorded by another writer: {msg}", path.display());
                    Ok(FileOutcome::Conflict)
                }
                Err(e) => store_failure(path, e),
            }
        }
        Some(record) if record.fingerprint == current => {
            tracing::debug!("up to date {}", path.display());
            Ok(FileOutcome::Unchanged)
        }
        Some(record) => {
            tracing::debug!(
                "changed {}: {} -> {current}",
                path.display(),
                record.fingerprint
            );
            let modified_at = stat(path)?;
            match store.update(path, &current, modified_at) {
                Ok(true) => Ok(FileOutcome::Updated),
                Ok(false) => {
                    tracing::warn!("record for {} disappeared before update", path.display());
                    Ok(FileOutcome::Conflict)
                }
                Err(e) => store_failure(path, e),
            }
        }
    }
}

fn stat(path: &Path) -> Result<Option<i64>, ScanError> {
    mod_time(path).map_err(|source| ScanError::Stat {
        path: path.to_path_buf(),
        source,
    })
}

fn store_failure(path: &Path, err: StoreError) -> Result<FileOutcome, ScanError> {
    if err.is_fatal() {
        return Err(err.into());
    }
    tracing::error!("{}: {err}", path.display());
    Ok(FileOutcome::StoreFailed)
}
