//! Task file discovery and decoding
//!
//! A task file can be written in YAML, JSON or TOML. Each format is handled by
//! a [`TaskSource`] adapter; discovery tries them in a fixed priority order.

use crate::config::types::TaskRegistry;
use crate::error::{ConfigError, ConfigResult, ParseError, ParseResult};
use std::fs;
use std::path::{Path, PathBuf};

/// Base name of the task file, without extension
pub const TASK_FILE_STEM: &str = "Taskfile";

/// A format that can decode a task file into a [`TaskRegistry`]
pub trait TaskSource {
    /// Human-readable format name
    fn name(&self) -> &'static str;

    /// File extensions handled by this format, in priority order
    fn extensions(&self) -> &'static [&'static str];

    /// Decode the file contents
    fn parse(&self, contents: &str) -> ParseResult<TaskRegistry>;
}

pub struct YamlSource;

impl TaskSource for YamlSource {
    fn name(&self) -> &'static str {
        "YAML"
    }

    fn extensions(&self) -> &'static [&'static str] {
        &["yml", "yaml"]
    }

    fn parse(&self, contents: &str) -> ParseResult<TaskRegistry> {
        Ok(serde_yaml::from_str(contents)?)
    }
}

pub struct JsonSource;

impl TaskSource for JsonSource {
    fn name(&self) -> &'static str {
        "JSON"
    }

    fn extensions(&self) -> &'static [&'static str] {
        &["json"]
    }

    fn parse(&self, contents: &str) -> ParseResult<TaskRegistry> {
        Ok(serde_json::from_str(contents)?)
    }
}

pub struct TomlSource;

impl TaskSource for TomlSource {
    fn name(&self) -> &'static str {
        "TOML"
    }

    fn extensions(&self) -> &'static [&'static str] {
        &["toml"]
    }

    fn parse(&self, contents: &str) -> ParseResult<TaskRegistry> {
        Ok(toml::from_str(contents)?)
    }
}

/// All supported formats, highest priority first
pub fn task_sources() -> [&'static dyn TaskSource; 3] {
    [&YamlSource, &JsonSource, &TomlSource]
}

/// Find and decode the task file in `dir`.
///
/// Candidates are tried in priority order and the first one that exists and
/// decodes wins. A candidate that fails to decode is skipped with a warning.
pub fn discover_task_file(dir: &Path) -> ConfigResult<(TaskRegistry, PathBuf)> {
    let mut searched = Vec::new();
    let mut last_error = None;

    for source in task_sources() {
        for ext in source.extensions() {
            let path = dir.join(format!("{}.{}", TASK_FILE_STEM, ext));
            searched.push(path.display().to_string());

            if !path.is_file() {
                continue;
            }

            match read_with(source, &path) {
                Ok(registry) => {
                    log::debug!("Loaded {} task file {}", source.name(), path.display());
                    return Ok((registry, path));
                }
                Err(e) => {
                    log::warn!("Skipping {}: {}", path.display(), e);
                    last_error = Some(e);
                }
            }
        }
    }

    Err(last_error.unwrap_or_else(|| ConfigError::NotFound(searched.join(", "))))
}

/// Decode an explicitly named task file.
///
/// The format is picked from the extension; an unknown extension tries every
/// format in priority order.
pub fn load_task_file(path: &Path) -> ConfigResult<TaskRegistry> {
    let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");

    if let Some(source) = task_sources()
        .into_iter()
        .find(|s| s.extensions().contains(&ext))
    {
        return read_with(source, path);
    }

    let contents = read_file(path)?;
    let mut last_error = None;
    for source in task_sources() {
        match source.parse(&contents) {
            Ok(registry) => return Ok(registry),
            Err(e) => last_error = Some(e),
        }
    }

    Err(match last_error {
        Some(source) => ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        },
        None => ConfigError::Invalid(format!("no decoder for {}", path.display())),
    })
}

fn read_with(source: &dyn TaskSource, path: &Path) -> ConfigResult<TaskRegistry> {
    let contents = read_file(path)?;
    source.parse(&contents).map_err(|e: ParseError| ConfigError::Parse {
        path: path.to_path_buf(),
        source: e,
    })
}

fn read_file(path: &Path) -> ConfigResult<String> {
    fs::read_to_string(path).map_err(|e| ConfigError::Read {
        path: path.to_path_buf(),
        source: e,
    })
}
