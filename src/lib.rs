//! Change detection for configured directory trees.
//!
//! Load rules with [`rules::load_config`], open a [`store::Store`], bootstrap
//! it with [`store::Store::ensure_schema`] and call [`scan::scan_once`]. The
//! returned [`scan::ScanOutcome`] says whether anything changed since the
//! previous scan against the same store.

pub mod cli;
pub mod config;
pub mod error;
pub mod fingerprint;
pub mod logging;
pub mod report;
pub mod rules;
pub mod scan;
pub mod store;

pub use error::{ConfigError, FingerprintError, ScanError, StoreError};
pub use rules::{load_config, ExclusionMode, ScanConfig};
pub use scan::{scan_once, ScanCounters, ScanOutcome};
pub use store::{SchemaStatus, Store, TrackedFile};
