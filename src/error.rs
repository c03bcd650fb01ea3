//! Error types for taskr

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for taskr operations
pub type Result<T> = std::result::Result<T, TaskrError>;

/// Main error type for taskr
#[derive(Error, Debug)]
pub enum TaskrError {
    /// Task file discovery, decoding and validation errors
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// A task (top-level or dependency) has no definition
    #[error("Task \"{0}\" not found")]
    TaskNotFound(String),

    /// A task was reached again after it had already started in this run
    #[error("Cyclic dependency detected at task \"{0}\"")]
    CyclicDependency(String),

    /// A command of the named task failed
    #[error("Failed to run task \"{task}\": {source}")]
    TaskRun {
        task: String,
        #[source]
        source: ExecutionError,
    },

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

/// Task file discovery and validation errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("No task file found (searched: {0})")]
    NotFound(String),

    #[error("Failed to read '{path}': {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Failed to parse '{path}': {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: ParseError,
    },

    #[error("Invalid task file: {0}")]
    Invalid(String),
}

/// Format-specific decoding errors
#[derive(Error, Debug)]
pub enum ParseError {
    #[error("YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML: {0}")]
    Toml(#[from] toml::de::Error),
}

/// Command execution errors
#[derive(Error, Debug)]
pub enum ExecutionError {
    #[error("Failed to spawn `{command}`: {source}")]
    Spawn {
        command: String,
        #[source]
        source: io::Error,
    },

    #[error("Command `{command}` failed with exit code {code:?}")]
    CommandFailed { command: String, code: Option<i32> },

    #[error("Command `{command}` was terminated by signal {signal}")]
    Terminated { command: String, signal: i32 },

    #[error("Captured output for '{0}' contains a NUL byte")]
    InvalidCapture(String),

    #[error("'{0}' cannot be used as an environment variable name")]
    InvalidCaptureName(String),
}

/// Specialized result type for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Specialized result type for execution operations
pub type ExecutionResult<T> = std::result::Result<T, ExecutionError>;

/// Specialized result type for decoding a task file
pub type ParseResult<T> = std::result::Result<T, ParseError>;
