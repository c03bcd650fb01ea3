//! Execution context for a run
//!
//! The context tracks all the state shared by the tasks of one invocation of
//! the runner: which tasks have started and which variables were captured.

use crate::config::schema::is_valid_env_name;
use crate::error::{ExecutionError, ExecutionResult};
use crate::runner::interpolate::substitute_with;
use std::collections::{HashMap, HashSet};
use std::env;
use std::path::{Path, PathBuf};

/// State of one run, passed through every recursive task call
#[derive(Debug)]
pub struct RunContext {
    /// Directory patterns and relative working directories are resolved against
    pub root: PathBuf,

    /// Tasks that have started in this run. Never cleared.
    visited: HashSet<String>,

    /// Variables captured from command output in this run
    exported: HashMap<String, String>,
}

impl RunContext {
    /// Create a new context rooted at the current directory
    pub fn new() -> Self {
        RunContext {
            root: env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
            visited: HashSet::new(),
            exported: HashMap::new(),
        }
    }

    /// Create a context with a specific root directory
    pub fn with_root(mut self, root: PathBuf) -> Self {
        self.root = root;
        self
    }

    /// Record that a task has started.
    ///
    /// Returns `false` if the task had already started earlier in this run.
    pub fn mark_visited(&mut self, task_name: &str) -> bool {
        self.visited.insert(task_name.to_string())
    }

    pub fn is_visited(&self, task_name: &str) -> bool {
        self.visited.contains(task_name)
    }

    /// Store a captured value and mirror it into the process environment so
    /// later subprocesses see it too.
    pub fn export(&mut self, name: &str, value: String) -> ExecutionResult<()> {
        if !is_valid_env_name(name) {
            return Err(ExecutionError::InvalidCaptureName(name.to_string()));
        }
        if value.contains('\0') {
            return Err(ExecutionError::InvalidCapture(name.to_string()));
        }
        env::set_var(name, &value);
        self.exported.insert(name.to_string(), value);
        Ok(())
    }

    /// Get a captured variable
    pub fn exported(&self, name: &str) -> Option<&String> {
        self.exported.get(name)
    }

    /// Look up a variable: task variables first, then captures, then the
    /// process environment.
    pub fn lookup(&self, task_vars: &HashMap<String, String>, name: &str) -> Option<String> {
        task_vars
            .get(name)
            .or_else(|| self.exported.get(name))
            .cloned()
            .or_else(|| env::var(name).ok())
    }

    /// Substitute placeholders through the full lookup chain
    pub fn substitute(&self, template: &str, task_vars: &HashMap<String, String>) -> String {
        substitute_with(template, |name| self.lookup(task_vars, name))
    }

    /// Resolve a (possibly empty) working directory against the root
    pub fn resolve_dir(&self, dir: &str) -> PathBuf {
        if dir.is_empty() {
            self.root.clone()
        } else {
            self.root.join(Path::new(dir))
        }
    }
}

impl Default for RunContext {
    fn default() -> Self {
        Self::new()
    }
}
