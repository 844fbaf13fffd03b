//! Scan rule loading.
//!
//! The rules file is line oriented:
//!
//! ```text
//! # comment
//! /srv/projects
//! /srv/assets|.psd, tmp
//! ```
//!
//! Each line names a directory, optionally followed by `|` and a comma
//! separated list of extensions to skip under that directory. All directories
//! in one file must share a path style (POSIX-like or Windows-like).

use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::error::{ConfigError, ParseReason};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum PathStyle {
    Posix,
    Windows,
}

impl PathStyle {
    /// Windows-like means the path carries both a backslash and a colon.
    /// This is only a consistency tag, nothing validates the path itself.
    pub fn classify(dir: &str) -> Self {
        if dir.contains('\\') && dir.contains(':') {
            PathStyle::Windows
        } else {
            PathStyle::Posix
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PathStyle::Posix => "posix",
            PathStyle::Windows => "windows",
        }
    }
}

/// How excluded extensions apply to directories.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub enum ExclusionMode {
    /// Extensions only apply to the directory whose line listed them.
    #[default]
    PerDirectory,
    /// Every listed extension applies to every directory.
    Global,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DirectoryRule {
    pub path: String,
    pub excluded: BTreeSet<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ScanConfig {
    /// Sorted, one rule per distinct directory.
    pub directories: Vec<DirectoryRule>,
    /// Union of all excluded extensions.
    pub excluded_extensions: BTreeSet<String>,
    pub style: Option<PathStyle>,
    pub exclusion_mode: ExclusionMode,
}

impl ScanConfig {
    pub fn with_exclusion_mode(mut self, mode: ExclusionMode) -> Self {
        self.exclusion_mode = mode;
        self
    }

    pub fn directory_paths(&self) -> impl Iterator<Item = &str> {
        self.directories.iter().map(|d| d.path.as_str())
    }

    /// Extensions to skip while walking `rule`'s directory.
    pub fn excluded_for<'a>(&'a self, rule: &'a DirectoryRule) -> &'a BTreeSet<String> {
        match self.exclusion_mode {
            ExclusionMode::PerDirectory => &rule.excluded,
            ExclusionMode::Global => &self.excluded_extensions,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.directories.is_empty()
    }
}

/// Reads and validates the rules file at `path`.
pub fn load_config(path: &Path) -> Result<ScanConfig, ConfigError> {
    let content = fs::read_to_string(path).map_err(|source| {
        if source.kind() == ErrorKind::NotFound {
            ConfigError::NotFound {
                path: path.to_path_buf(),
            }
        } else {
            ConfigError::Read {
                path: path.to_path_buf(),
                source,
            }
        }
    })?;

    let config = parse_config(&content).map_err(|(line, reason)| ConfigError::Parse {
        path: path.to_path_buf(),
        line,
        reason,
    })?;

    tracing::debug!(
        "loaded {} directories and {} excluded extensions from {}",
        config.directories.len(),
        config.excluded_extensions.len(),
        path.display()
    );

    Ok(config)
}

/// Parses rules text. Errors carry the 1-based line number.
pub fn parse_config(content: &str) -> Result<ScanConfig, (usize, ParseReason)> {
    let mut by_dir: BTreeMap<String, BTreeSet<String>> = BTreeMap::new();
    let mut all_excluded = BTreeSet::new();
    let mut style: Option<PathStyle> = None;

    for (index, raw) in content.lines().enumerate() {
        let line_no = index + 1;
        let line = raw.trim();

        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let parts: Vec<&str> = line.split('|').collect();
        if parts.len() > 2 {
            return Err((line_no, ParseReason::TooManySeparators(parts.len() - 1)));
        }

        let dir = parts[0].trim();
        if dir.is_empty() {
            return Err((line_no, ParseReason::MissingDirectory));
        }

        let this_style = PathStyle::classify(dir);
        match style {
            None => style = Some(this_style),
            Some(expected) if expected != this_style => {
                return Err((
                    line_no,
                    ParseReason::MixedStyle {
                        dir: dir.to_string(),
                        found: this_style.as_str(),
                        expected: expected.as_str(),
                    },
                ));
            }
            Some(_) => {}
        }

        let excluded = by_dir.entry(dir.to_string()).or_default();
        if let Some(list) = parts.get(1) {
            for ext in list.split(',').filter_map(normalize_extension) {
                all_excluded.insert(ext.clone());
                excluded.insert(ext);
            }
        }
    }

    let directories = by_dir
        .into_iter()
        .map(|(path, excluded)| DirectoryRule { path, excluded })
        .collect();

    Ok(ScanConfig {
        directories,
        excluded_extensions: all_excluded,
        style,
        exclusion_mode: ExclusionMode::default(),
    })
}

// " .TXT " -> "TXT", "" and "." -> nothing (a missing extension is never excluded)
fn normalize_extension(raw: &str) -> Option<String> {
    let ext = raw.trim();
    let ext = ext.strip_prefix('.').unwrap_or(ext).trim();
    if ext.is_empty() {
        None
    } else {
        Some(ext.to_string())
    }
}

/// Default rules file name: `<program>.ini` next to where the tool runs.
pub fn default_rules_path(program: &str) -> PathBuf {
    PathBuf::from(format!("{program}.ini"))
}
