use std::fmt::Display;

use clap::Parser;
use filechanges::cli::{Cli, Command};
use filechanges::config::Config;
use filechanges::error::ScanError;
use filechanges::logging;
use filechanges::report;
use filechanges::rules::{self, ScanConfig};
use filechanges::scan;
use filechanges::store::{SchemaStatus, Store};

fn fail(message: impl Display) -> ! {
    tracing::error!("{message}");
    eprintln!("error: {message}");
    std::process::exit(1);
}

fn open_store(config: &Config) -> Store {
    Store::open(&config.db_path, &config.table).unwrap_or_else(|e| fail(e))
}

fn bootstrap(store: &mut Store) -> SchemaStatus {
    store.ensure_schema().unwrap_or_else(|e| {
        fail(format_args!(
            "failed to create table \"{}\" in {}: {e}",
            store.table(),
            store.location().display()
        ))
    })
}

fn run_scan(rules: &ScanConfig, store: &mut Store, config: &Config) {
    let outcome = match scan::scan_once(rules, store) {
        Ok(outcome) => outcome,
        Err(ScanError::Store(e)) => fail(format_args!(
            "scan aborted, record store {}: {e}",
            store.location().display()
        )),
        Err(e) => fail(format_args!("scan aborted: {e}")),
    };

    if let Err(e) = report::print(&outcome, config) {
        fail(format_args!("failed to render scan summary: {e}"));
    }
}

fn main() {
    let cli = Cli::parse();

    if let Err(e) = logging::init(cli.verbose) {
        eprintln!("warning: {e}");
    }

    let config = Config::from_cli(&cli).unwrap_or_else(|e| fail(e));

    match cli.command {
        None | Some(Command::Scan(_)) => {
            let rules = rules::load_config(&config.rules_path)
                .unwrap_or_else(|e| fail(e))
                .with_exclusion_mode(config.exclusion_mode);

            tracing::debug!("rules file: {}", config.rules_path.display());
            tracing::debug!("database file: {}", config.db_path.display());
            tracing::debug!("table: {}", config.table);

            let mut store = open_store(&config);
            bootstrap(&mut store);

            match config.watch {
                None => run_scan(&rules, &mut store, &config),
                Some(delay) => {
                    tracing::info!(
                        "looping with a delay of {} between scans",
                        humantime::format_duration(delay)
                    );

                    let mut iteration: u64 = 0;
                    loop {
                        iteration += 1;
                        tracing::info!("scan {iteration}");
                        run_scan(&rules, &mut store, &config);

                        if !delay.is_zero() {
                            std::thread::sleep(delay);
                        }
                    }
                }
            }
        }
        Some(Command::List(_)) => {
            let mut store = open_store(&config);
            bootstrap(&mut store);

            let records = store.list().unwrap_or_else(|e| fail(e));
            if let Err(e) = report::print_records(&records, &config) {
                fail(format_args!("failed to render records: {e}"));
            }
        }
        Some(Command::Init) => {
            let mut store = open_store(&config);
            match bootstrap(&mut store) {
                SchemaStatus::Created => println!(
                    "created table \"{}\" in {}",
                    store.table(),
                    store.location().display()
                ),
                SchemaStatus::AlreadyExists => println!(
                    "table \"{}\" already exists in {}",
                    store.table(),
                    store.location().display()
                ),
            }
        }
    }
}
