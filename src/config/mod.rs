//! Task file loading and validation
//!
//! This module decodes Taskfile.yml / Taskfile.json / Taskfile.toml into a
//! [`TaskRegistry`] and validates it.

pub mod parse;
pub mod schema;
pub mod types;

// Re-export main types
pub use parse::*;
pub use schema::*;
pub use types::*;
