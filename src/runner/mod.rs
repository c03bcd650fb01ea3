//! Task execution engine
//!
//! This module resolves task dependencies, checks whether tasks are up to date,
//! substitutes variables and runs commands.

pub mod command;
pub mod context;
pub mod freshness;
pub mod interpolate;
pub mod task;

// Re-export main types
pub use command::*;
pub use context::*;
pub use freshness::*;
pub use interpolate::*;
pub use task::*;
