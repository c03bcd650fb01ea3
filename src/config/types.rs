//! Core configuration types
//!
//! This module defines the data structures a decoded task file maps onto. The
//! shape is shared by every supported format.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::collections::HashMap;

/// All tasks of a task file, keyed by task name
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(transparent)]
pub struct TaskRegistry {
    tasks: BTreeMap<String, TaskDefinition>,
}

impl TaskRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace a task definition
    pub fn insert(&mut self, name: impl Into<String>, task: TaskDefinition) {
        self.tasks.insert(name.into(), task);
    }

    /// Look up a task by name
    pub fn get(&self, name: &str) -> Option<&TaskDefinition> {
        self.tasks.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.tasks.contains_key(name)
    }

    /// Iterate over tasks in name order
    pub fn iter(&self) -> impl Iterator<Item = (&String, &TaskDefinition)> {
        self.tasks.iter()
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }
}

impl FromIterator<(String, TaskDefinition)> for TaskRegistry {
    fn from_iter<I: IntoIterator<Item = (String, TaskDefinition)>>(iter: I) -> Self {
        TaskRegistry {
            tasks: iter.into_iter().collect(),
        }
    }
}

/// A task definition
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct TaskDefinition {
    /// Command templates, run in order
    #[serde(default, deserialize_with = "deserialize_string_list")]
    pub cmds: Vec<String>,

    /// Task name templates to run before the commands
    #[serde(default, deserialize_with = "deserialize_string_list")]
    pub deps: Vec<String>,

    /// Glob patterns of the inputs used for the up-to-date check
    #[serde(default, deserialize_with = "deserialize_string_list")]
    pub sources: Vec<String>,

    /// Glob patterns of the files the task produces
    #[serde(default, deserialize_with = "deserialize_string_list")]
    pub generates: Vec<String>,

    /// Working directory template for the commands
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dir: Option<String>,

    /// Static variables available to placeholders
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub variables: HashMap<String, String>,

    /// Variable that receives the output of each command
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub set: Option<String>,
}

impl TaskDefinition {
    /// Working directory template, if one is set and non-empty
    pub fn working_dir(&self) -> Option<&str> {
        self.dir.as_deref().filter(|d| !d.is_empty())
    }

    /// Capture variable name, if one is set and non-empty
    pub fn capture_variable(&self) -> Option<&str> {
        self.set.as_deref().filter(|s| !s.is_empty())
    }

    /// Whether both sides of the up-to-date check are declared
    pub fn has_freshness_inputs(&self) -> bool {
        !self.sources.is_empty() && !self.generates.is_empty()
    }
}

/// Accepts either a single string or a list of strings
#[derive(Deserialize)]
#[serde(untagged)]
enum StringOrList {
    One(String),
    Many(Vec<String>),
}

/// Custom deserializer for fields that take one value or an array
fn deserialize_string_list<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let value: Option<StringOrList> = Option::deserialize(deserializer)?;

    Ok(match value {
        Some(StringOrList::One(s)) => vec![s],
        Some(StringOrList::Many(list)) => list,
        None => Vec::new(),
    })
}
