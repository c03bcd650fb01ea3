//! Up-to-date checks
//!
//! A task is up to date when the oldest file matched by its output patterns is
//! strictly newer than the newest file matched by its source patterns.

use glob::{glob, Pattern};
use std::path::{Path, PathBuf};
use std::time::SystemTime;

/// Whether the outputs of a task are newer than its sources.
///
/// Patterns are expected to be substituted already. Relative patterns are
/// resolved against `root`. Empty pattern lists, patterns that match nothing
/// and glob errors all count as "not up to date".
pub fn is_up_to_date(sources: &[String], generates: &[String], root: &Path) -> bool {
    if sources.is_empty() || generates.is_empty() {
        return false;
    }

    let newest_source = match newest_timestamp(sources, root) {
        Some(time) => time,
        None => return false,
    };

    let oldest_output = match oldest_timestamp(generates, root) {
        Some(time) => time,
        None => return false,
    };

    oldest_output > newest_source
}

/// Latest modification time among all matches
pub fn newest_timestamp(patterns: &[String], root: &Path) -> Option<SystemTime> {
    modification_times(patterns, root)?.into_iter().max()
}

/// Earliest modification time among all matches
pub fn oldest_timestamp(patterns: &[String], root: &Path) -> Option<SystemTime> {
    modification_times(patterns, root)?.into_iter().min()
}

/// Modification times of every path matched by `patterns`.
///
/// `None` if any pattern is invalid or any match cannot be inspected.
fn modification_times(patterns: &[String], root: &Path) -> Option<Vec<SystemTime>> {
    let mut times = Vec::new();

    for path in expand_patterns(patterns, root)? {
        match path.metadata().and_then(|m| m.modified()) {
            Ok(time) => times.push(time),
            Err(e) => {
                log::debug!("Cannot read modification time of {}: {}", path.display(), e);
                return None;
            }
        }
    }

    Some(times)
}

/// Expand glob patterns relative to `root`
pub fn expand_patterns(patterns: &[String], root: &Path) -> Option<Vec<PathBuf>> {
    let mut result = Vec::new();

    for pattern in patterns {
        let full = anchor_pattern(pattern, root);
        let paths = match glob(&full) {
            Ok(paths) => paths,
            Err(e) => {
                log::debug!("Invalid pattern '{}': {}", pattern, e);
                return None;
            }
        };

        for entry in paths {
            match entry {
                Ok(path) => result.push(path),
                Err(e) => {
                    log::debug!("Failed to expand '{}': {}", pattern, e);
                    return None;
                }
            }
        }
    }

    Some(result)
}

fn anchor_pattern(pattern: &str, root: &Path) -> String {
    if Path::new(pattern).is_absolute() {
        pattern.to_string()
    } else {
        let prefix = Pattern::escape(&root.to_string_lossy());
        format!("{}/{}", prefix.trim_end_matches('/'), pattern)
    }
}
