//! Plain text rendering.
//!
//! - summary block with the run's counters and the changed flag
//! - optional list of new and modified paths
//! - tracked record listing with formatted mtimes

use crate::scan::ScanOutcome;
use crate::store::TrackedFile;

const FINGERPRINT_PREFIX: usize = 12;

pub fn render(outcome: &ScanOutcome) -> String {
    let c = &outcome.counters;
    let mut output = String::new();

    output.push_str("=== SUMMARY STATISTICS ===\n");
    output.push_str(&format!("{:<28}= {}\n", "Number of folders checked", c.folders));
    output.push_str(&format!("{:<28}= {}\n", "Number of files checked", c.checked));
    output.push_str(&format!("{:<28}= {}\n", "Number of files skipped", c.skipped));
    output.push_str(&format!("{:<28}= {}\n", "Number of files changed", c.changed));
    output.push_str(&format!("{:<28}= {}\n", "Number of files unchanged", c.unchanged));
    if c.errors > 0 {
        output.push_str(&format!("{:<28}= {}\n", "Number of store errors", c.errors));
    }
    output.push_str(&format!("{:<28}= {}\n", "Files changed flag", outcome.any_changed));

    output
}

pub fn render_changes(outcome: &ScanOutcome) -> String {
    let mut output = String::new();

    for change in &outcome.changes {
        output.push_str(&format!(
            "  [{}] {}\n",
            change.kind.as_str(),
            change.path.display()
        ));
    }

    output
}

pub fn render_records(records: &[TrackedFile]) -> String {
    if records.is_empty() {
        return String::from("No files tracked yet.\n");
    }

    let mut output = String::new();
    output.push_str(&format!("{:<20} {:<12} {}\n", "Modified", "Fingerprint", "Path"));
    output.push_str(&"-".repeat(60));
    output.push('\n');

    for record in records {
        let modified = record
            .modified_at
            .and_then(|ts| chrono::DateTime::from_timestamp(ts, 0))
            .map(|dt| dt.format("%Y-%m-%d %H:%M:%S").to_string())
            .unwrap_or_else(|| "unknown".to_string());

        let prefix: String = record.fingerprint.chars().take(FINGERPRINT_PREFIX).collect();

        output.push_str(&format!(
            "{:<20} {:<12} {}\n",
            modified,
            prefix,
            record.path.display()
        ));
    }

    output.push_str(&format!("\n{} files tracked\n", records.len()));
    output
}
