//! Tracing subscriber setup for the binary.
//!
//! Events go to stderr so stdout only carries the summary or JSON. `RUST_LOG`
//! takes precedence; otherwise `--verbose` or `DEBUG=Y` selects debug level.

use tracing_subscriber::EnvFilter;

#[derive(Debug, thiserror::Error)]
pub enum LoggingError {
    #[error("failed to install global tracing subscriber: {0}")]
    SetGlobal(#[source] Box<dyn std::error::Error + Send + Sync>),
}

pub fn init(verbose: bool) -> Result<(), LoggingError> {
    let debug_env = std::env::var("DEBUG").ok();
    let filter = build_env_filter(default_level(verbose, debug_env.as_deref()));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init()
        .map_err(LoggingError::SetGlobal)
}

fn build_env_filter(default_level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level))
}

fn default_level(verbose: bool, debug_env: Option<&str>) -> &'static str {
    if verbose || debug_env.is_some_and(|v| v.eq_ignore_ascii_case("y")) {
        "debug"
    } else {
        "info"
    }
}
