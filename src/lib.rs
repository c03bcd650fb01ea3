//! taskr - a small declarative task runner
//!
//! taskr reads named tasks from a Taskfile (YAML, JSON or TOML) and runs the
//! requested ones, running their dependencies first and skipping tasks whose
//! generated files are newer than their sources.

// Public modules
pub mod cli;
pub mod config;
pub mod error;
pub mod runner;

// Re-export commonly used types
pub use config::{TaskDefinition, TaskRegistry};
pub use error::{Result, TaskrError};
pub use runner::{RunContext, Runner, TaskStatus};

/// Current version of taskr
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
