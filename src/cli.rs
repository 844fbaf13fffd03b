use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use std::time::Duration;

use crate::store::DEFAULT_TABLE;

#[derive(Parser)]
#[command(name = "filechanges")]
#[command(about = "Reports which files are new or changed since the last run")]
#[command(version)]
pub struct Cli {
    /// Rules file listing directories and excluded extensions (defaults to <program>.ini)
    #[arg(long, short = 'c', global = true)]
    pub config: Option<PathBuf>,

    /// Database file (defaults to the platform data directory)
    #[arg(long, global = true)]
    pub db: Option<PathBuf>,

    /// Table holding the file records
    #[arg(long, global = true, default_value = DEFAULT_TABLE)]
    pub table: String,

    /// Enable debug logging
    #[arg(long, short = 'v', global = true, default_value_t = false)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand)]
pub enum Command {
    /// Scan the configured directories and record fingerprints (default)
    Scan(ScanArgs),

    /// Print every tracked file
    List(ListArgs),

    /// Create the record table if it does not exist
    Init,
}

#[derive(Args, Clone, Default)]
pub struct ScanArgs {
    /// Keep scanning until interrupted
    #[arg(long = "loop", short = 'l', default_value_t = false)]
    pub watch: bool,

    /// Delay between scans when looping, e.g. "3s" or "1m"
    #[arg(long, short = 't', value_parser = humantime::parse_duration, requires = "watch")]
    pub delay: Option<Duration>,

    /// Apply every excluded extension to every directory
    #[arg(long, default_value_t = false)]
    pub merge_excludes: bool,

    /// Print the paths of new and modified files
    #[arg(long, default_value_t = false)]
    pub list_changes: bool,

    /// Output as JSON instead of the summary table
    #[arg(long, default_value_t = false)]
    pub json: bool,
}

#[derive(Args, Clone, Default)]
pub struct ListArgs {
    /// Output as JSON
    #[arg(long, default_value_t = false)]
    pub json: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn no_subcommand_is_allowed() {
        let cli = Cli::try_parse_from(["filechanges"]).unwrap();
        assert!(cli.command.is_none());
        assert_eq!(cli.table, "status");
    }

    #[test]
    fn loop_with_delay() {
        let cli = Cli::try_parse_from(["filechanges", "scan", "--loop", "--delay", "5s"]).unwrap();
        let Some(Command::Scan(args)) = cli.command else {
            panic!("expected scan");
        };
        assert!(args.watch);
        assert_eq!(args.delay, Some(Duration::from_secs(5)));
    }

    #[test]
    fn delay_requires_loop() {
        assert!(Cli::try_parse_from(["filechanges", "scan", "--delay", "5s"]).is_err());
    }

    #[test]
    fn global_flags_after_subcommand() {
        let cli = Cli::try_parse_from(["filechanges", "list", "--table", "files", "--json"]).unwrap();
        assert_eq!(cli.table, "files");
        assert!(matches!(cli.command, Some(Command::List(ListArgs { json: true }))));
    }
}
