use serde::{Deserialize, Serialize};

use crate::tasks::Task;

/// Categories offered before the user has created any of their own.
pub const DEFAULT_CATEGORIES: [&str; 3] = ["Work", "Personal", "Shopping"];

/// Global, append-only list of category names in insertion order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CategoryList {
    names: Vec<String>,
}

impl Default for CategoryList {
    fn default() -> Self {
        Self {
            names: DEFAULT_CATEGORIES.iter().map(|c| c.to_string()).collect(),
        }
    }
}

impl CategoryList {
    pub fn from_names(names: Vec<String>) -> Self {
        let mut list = Self { names: Vec::new() };
        for name in names {
            list.insert(&name);
        }
        list
    }

    pub fn as_slice(&self) -> &[String] {
        &self.names
    }

    pub fn iter(&self) -> std::slice::Iter<'_, String> {
        self.names.iter()
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.names.iter().any(|n| n == name)
    }

    /// Append a trimmed, non-blank name that is not yet known. Returns whether it was added.
    pub fn insert(&mut self, name: &str) -> bool {
        let name = name.trim();
        if name.is_empty() || self.contains(name) {
            return false;
        }
        self.names.push(name.to_string());
        true
    }

    /// Append every category used by `tasks` that the list does not know yet.
    pub fn absorb<'a>(&mut self, tasks: impl IntoIterator<Item = &'a Task>) -> bool {
        let mut changed = false;
        for task in tasks {
            for name in &task.categories {
                changed |= self.insert(name);
            }
        }
        changed
    }
}
