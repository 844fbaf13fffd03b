//! JSON output for scan outcomes and record listings.
//!
//! Meant for scripts that branch on `any_changed`.

use crate::scan::ScanOutcome;
use crate::store::TrackedFile;

pub fn render(outcome: &ScanOutcome) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(outcome)
}

pub fn render_records(records: &[TrackedFile]) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(records)
}
