//! Task file validation
//!
//! Checks that can be made before any task runs. Dependency names are
//! templates, so their existence is only checked when they are resolved.

use crate::config::types::{TaskDefinition, TaskRegistry};
use crate::error::{ConfigError, ConfigResult};

/// Validate every task of a registry
pub fn validate_registry(registry: &TaskRegistry) -> ConfigResult<()> {
    for (name, task) in registry.iter() {
        validate_task(name, task)?;
    }
    Ok(())
}

/// Validate a single task
pub fn validate_task(name: &str, task: &TaskDefinition) -> ConfigResult<()> {
    if name.trim().is_empty() {
        return Err(ConfigError::Invalid("task names must not be empty".to_string()));
    }

    // `set` ends up in the process environment
    if let Some(var) = task.capture_variable() {
        if !is_valid_env_name(var) {
            return Err(ConfigError::Invalid(format!(
                "task \"{}\": '{}' cannot be used as an environment variable name",
                name, var
            )));
        }
    }

    if task.variables.keys().any(|k| k.is_empty()) {
        return Err(ConfigError::Invalid(format!(
            "task \"{}\": variable names must not be empty",
            name
        )));
    }

    Ok(())
}

pub(crate) fn is_valid_env_name(name: &str) -> bool {
    !name.is_empty() && !name.contains('=') && !name.contains('\0')
}
