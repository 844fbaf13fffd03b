use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::cli::{Cli, Command, ScanArgs};
use crate::error::ConfigError;
use crate::rules::{self, ExclusionMode};

pub const DEFAULT_LOOP_DELAY: Duration = Duration::from_secs(3);
const FALLBACK_PROGRAM_NAME: &str = "filechanges";

/// Settings for one invocation, resolved once from the command line.
pub struct Config {
    pub rules_path: PathBuf,
    pub db_path: PathBuf,
    pub table: String,
    pub exclusion_mode: ExclusionMode,
    /// Delay between scans, `None` for a single scan.
    pub watch: Option<Duration>,
    pub json_output: bool,
    pub list_changes: bool,
}

impl Config {
    pub fn from_cli(cli: &Cli) -> Result<Self, ConfigError> {
        let program = program_name();

        let scan_args = match &cli.command {
            Some(Command::Scan(args)) => args.clone(),
            _ => ScanArgs::default(),
        };
        let json_output = match &cli.command {
            Some(Command::List(args)) => args.json,
            _ => scan_args.json,
        };

        let rules_path = cli
            .config
            .clone()
            .unwrap_or_else(|| rules::default_rules_path(&program));

        let db_path = match &cli.db {
            Some(path) => path.clone(),
            None => default_db_path(&program)?,
        };

        let exclusion_mode = if scan_args.merge_excludes {
            ExclusionMode::Global
        } else {
            ExclusionMode::PerDirectory
        };

        let watch = scan_args
            .watch
            .then(|| scan_args.delay.unwrap_or(DEFAULT_LOOP_DELAY));

        Ok(Config {
            rules_path,
            db_path,
            table: cli.table.clone(),
            exclusion_mode,
            watch,
            json_output,
            list_changes: scan_args.list_changes,
        })
    }
}

/// File stem of the running executable.
pub fn program_name() -> String {
    std::env::current_exe()
        .ok()
        .and_then(|exe| exe.file_stem().map(|s| s.to_string_lossy().into_owned()))
        .filter(|name| !name.is_empty())
        .unwrap_or_else(|| FALLBACK_PROGRAM_NAME.to_string())
}

/// `<data dir>/<program>.db`, e.g. ~/.local/share/filechanges/filechanges.db
fn default_db_path(program: &str) -> Result<PathBuf, ConfigError> {
    let data_dir = directories::ProjectDirs::from("", "", FALLBACK_PROGRAM_NAME)
        .ok_or(ConfigError::NoDataDir)?
        .data_dir()
        .to_path_buf();

    ensure_dir(&data_dir)?;
    Ok(data_dir.join(format!("{program}.db")))
}

fn ensure_dir(dir: &Path) -> Result<(), ConfigError> {
    std::fs::create_dir_all(dir).map_err(|source| ConfigError::CreateDir {
        path: dir.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    fn config(args: &[&str]) -> Config {
        let mut argv = vec!["filechanges", "--db", "/tmp/test.db"];
        argv.extend_from_slice(args);
        Config::from_cli(&Cli::parse_from(argv)).unwrap()
    }

    #[test]
    fn single_scan_by_default() {
        let config = config(&[]);
        assert_eq!(config.watch, None);
        assert_eq!(config.table, "status");
        assert_eq!(config.exclusion_mode, ExclusionMode::PerDirectory);
        assert_eq!(config.db_path, PathBuf::from("/tmp/test.db"));
        assert!(config.rules_path.to_string_lossy().ends_with(".ini"));
    }

    #[test]
    fn loop_without_delay_uses_default() {
        let config = config(&["scan", "--loop"]);
        assert_eq!(config.watch, Some(DEFAULT_LOOP_DELAY));
    }

    #[test]
    fn explicit_delay_and_merge() {
        let config = config(&["scan", "-l", "-t", "250ms", "--merge-excludes", "--json"]);
        assert_eq!(config.watch, Some(Duration::from_millis(250)));
        assert_eq!(config.exclusion_mode, ExclusionMode::Global);
        assert!(config.json_output);
    }

    #[test]
    fn list_json_flag_is_honoured() {
        let config = config(&["list", "--json"]);
        assert!(config.json_output);
    }

    #[test]
    fn explicit_rules_path_wins() {
        let config = config(&["-c", "rules.txt"]);
        assert_eq!(config.rules_path, PathBuf::from("rules.txt"));
    }
}
