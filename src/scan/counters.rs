use serde::Serialize;

use super::FileOutcome;

/// Per-run tallies. `changed` counts inserts and updates together.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ScanCounters {
    pub folders: u64,
    pub checked: u64,
    pub skipped: u64,
    pub changed: u64,
    pub unchanged: u64,
    /// Files whose store step failed; each is also counted as skipped.
    pub errors: u64,
}

impl ScanCounters {
    /// Books one file. Every file passed here has already been counted as checked.
    pub fn record(&mut self, outcome: &FileOutcome) {
        match outcome {
            FileOutcome::Inserted | FileOutcome::Updated => self.changed += 1,
            FileOutcome::Unchanged => self.unchanged += 1,
            FileOutcome::Excluded | FileOutcome::NotRegular | FileOutcome::Conflict => {
                self.skipped += 1
            }
            FileOutcome::StoreFailed => {
                self.skipped += 1;
                self.errors += 1;
            }
            FileOutcome::Unreadable => {}
        }
    }
}
