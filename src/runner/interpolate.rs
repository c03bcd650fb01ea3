//! Variable resolution and placeholder substitution
//!
//! Placeholders use the `{{VAR}}` syntax. Substitution is a single left-to-right
//! pass: replaced text is never scanned again, and placeholders with no value
//! are left as written.

use crate::config::TaskDefinition;
use regex::{Captures, Regex};
use std::collections::HashMap;
use std::sync::OnceLock;

fn placeholder_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\{\{\s*([^{}\s]+)\s*\}\}").expect("placeholder regex is valid"))
}

/// Variables a task brings into scope.
///
/// Only the task's static variables; exported captures are consulted at
/// substitution time instead of being merged here.
pub fn resolve(task: &TaskDefinition) -> HashMap<String, String> {
    task.variables.clone()
}

/// Replace `{{VAR}}` placeholders with values from `vars`
pub fn substitute(template: &str, vars: &HashMap<String, String>) -> String {
    substitute_with(template, |name| vars.get(name).cloned())
}

/// Replace placeholders using an arbitrary lookup
pub fn substitute_with<F>(template: &str, mut lookup: F) -> String
where
    F: FnMut(&str) -> Option<String>,
{
    placeholder_regex()
        .replace_all(template, |caps: &Captures| {
            lookup(&caps[1]).unwrap_or_else(|| caps[0].to_string())
        })
        .into_owned()
}

/// Substitute every string of a list
pub fn substitute_list<F>(list: &[String], mut lookup: F) -> Vec<String>
where
    F: FnMut(&str) -> Option<String>,
{
    list.iter()
        .map(|s| substitute_with(s, &mut lookup))
        .collect()
}
