pub mod table;
pub mod json;

use crate::config::Config;
use crate::scan::ScanOutcome;
use crate::store::TrackedFile;

pub fn print(outcome: &ScanOutcome, config: &Config) -> Result<(), serde_json::Error> {
    if config.json_output {
        println!("{}", json::render(outcome)?);
    } else {
        print!("{}", table::render(outcome));
        if config.list_changes {
            print!("{}", table::render_changes(outcome));
        }
    }
    Ok(())
}

pub fn print_records(records: &[TrackedFile], config: &Config) -> Result<(), serde_json::Error> {
    if config.json_output {
        println!("{}", json::render_records(records)?);
    } else {
        print!("{}", table::render_records(records));
    }
    Ok(())
}
