use std::{fmt, str::FromStr};

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::ParseError;

/// Task identifier: creation time in milliseconds since the Unix epoch.
pub type TaskId = i64;

/// Date layout used for due dates, both on disk and on the command line.
pub const DUE_DATE_FORMAT: &str = "%Y-%m-%d";

/// Task priority. New tasks start at `Medium`.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    #[default]
    Medium,
    High,
}

impl Priority {
    pub const ALL: [Priority; 3] = [Priority::Low, Priority::Medium, Priority::High];

    pub fn as_str(self) -> &'static str {
        match self {
            Priority::Low => "low",
            Priority::Medium => "medium",
            Priority::High => "high",
        }
    }

    /// Next priority in `low → medium → high → low` order.
    pub fn next(self) -> Self {
        match self {
            Priority::Low => Priority::Medium,
            Priority::Medium => Priority::High,
            Priority::High => Priority::Low,
        }
    }

    pub fn previous(self) -> Self {
        match self {
            Priority::Low => Priority::High,
            Priority::Medium => Priority::Low,
            Priority::High => Priority::Medium,
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Priority {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "low" => Ok(Priority::Low),
            "medium" => Ok(Priority::Medium),
            "high" => Ok(Priority::High),
            _ => Err(ParseError::new("priority", s, "low, medium, high")),
        }
    }
}

/// Task entity as persisted under the `tasks` key.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: TaskId,
    pub text: String,
    #[serde(default)]
    pub completed: bool,
    #[serde(default)]
    pub priority: Priority,
    #[serde(default, with = "due_date_serde")]
    pub due_date: Option<NaiveDate>,
    /// Ordered set of category names; only the first is shown in list views.
    #[serde(default)]
    pub categories: Vec<String>,
    pub created_at: DateTime<Utc>,
}

impl Task {
    pub fn new(id: TaskId, text: impl Into<String>, created_at: DateTime<Utc>) -> Self {
        Self {
            id,
            text: text.into(),
            completed: false,
            priority: Priority::Medium,
            due_date: None,
            categories: Vec::new(),
            created_at,
        }
    }

    pub fn has_category(&self, name: &str) -> bool {
        self.categories.iter().any(|c| c == name)
    }
}

/// Full set of editable fields, applied wholesale by [`TaskCollection::update`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskUpdate {
    pub text: String,
    pub priority: Priority,
    pub due_date: Option<NaiveDate>,
    pub categories: Vec<String>,
    pub completed: bool,
}

impl From<&Task> for TaskUpdate {
    fn from(task: &Task) -> Self {
        Self {
            text: task.text.clone(),
            priority: task.priority,
            due_date: task.due_date,
            categories: task.categories.clone(),
            completed: task.completed,
        }
    }
}

/// Running counters shown next to the list.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TaskStats {
    pub total: usize,
    pub completed: usize,
    pub pending: usize,
}

/// Ordered in-memory task list. Index 0 is the head (newest unless reordered).
///
/// Every mutation addressed by id is a silent no-op when the id is unknown;
/// the boolean results only tell the caller whether anything changed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskCollection {
    tasks: Vec<Task>,
}

impl TaskCollection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn as_slice(&self) -> &[Task] {
        &self.tasks
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Task> {
        self.tasks.iter()
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    pub fn get(&self, id: TaskId) -> Option<&Task> {
        self.tasks.iter().find(|t| t.id == id)
    }

    pub fn position(&self, id: TaskId) -> Option<usize> {
        self.tasks.iter().position(|t| t.id == id)
    }

    /// Create a task from trimmed `text` and insert it at the head.
    /// Returns `None` (and changes nothing) when the text is blank.
    pub fn add(&mut self, text: &str, now: DateTime<Utc>) -> Option<TaskId> {
        let text = text.trim();
        if text.is_empty() {
            return None;
        }
        let id = self.next_id(now);
        self.tasks.insert(0, Task::new(id, text, now));
        Some(id)
    }

    pub fn toggle_complete(&mut self, id: TaskId) -> bool {
        match self.tasks.iter_mut().find(|t| t.id == id) {
            Some(task) => {
                task.completed = !task.completed;
                true
            }
            None => false,
        }
    }

    /// Overwrite the editable fields of a task. Blank text rejects the whole update.
    pub fn update(&mut self, id: TaskId, update: TaskUpdate) -> bool {
        let text = update.text.trim();
        if text.is_empty() {
            return false;
        }
        let Some(task) = self.tasks.iter_mut().find(|t| t.id == id) else {
            return false;
        };
        task.text = text.to_string();
        task.priority = update.priority;
        task.due_date = update.due_date;
        task.categories = update.categories;
        task.completed = update.completed;
        true
    }

    pub fn remove(&mut self, id: TaskId) -> bool {
        match self.position(id) {
            Some(idx) => {
                self.tasks.remove(idx);
                true
            }
            None => false,
        }
    }

    /// Move `source` to the index `target` occupied before the move.
    ///
    /// This is a splice, not a swap: everything between the two positions
    /// shifts by one. Two relocations in opposite directions are therefore
    /// not inverse to each other once other tasks sit between them.
    pub fn reorder(&mut self, source: TaskId, target: TaskId) -> bool {
        if source == target {
            return false;
        }
        let (Some(from), Some(to)) = (self.position(source), self.position(target)) else {
            return false;
        };
        move_to_index(&mut self.tasks, from, to);
        true
    }

    pub fn stats(&self) -> TaskStats {
        let completed = self.tasks.iter().filter(|t| t.completed).count();
        TaskStats {
            total: self.tasks.len(),
            completed,
            pending: self.tasks.len() - completed,
        }
    }

    fn next_id(&self, now: DateTime<Utc>) -> TaskId {
        let stamp = now.timestamp_millis();
        match self.tasks.iter().map(|t| t.id).max() {
            Some(max) if max >= stamp => max + 1,
            _ => stamp,
        }
    }
}

impl<'a> IntoIterator for &'a TaskCollection {
    type Item = &'a Task;
    type IntoIter = std::slice::Iter<'a, Task>;

    fn into_iter(self) -> Self::IntoIter {
        self.tasks.iter()
    }
}

/// Remove the element at `from` and reinsert it at `to`, clamped to the end.
pub fn move_to_index<T>(items: &mut Vec<T>, from: usize, to: usize) {
    if from >= items.len() {
        return;
    }
    let item = items.remove(from);
    let to = to.min(items.len());
    items.insert(to, item);
}

/// `dueDate` is written as `YYYY-MM-DD`; empty strings from older clients read as absent.
mod due_date_serde {
    use chrono::NaiveDate;
    use serde::{Deserialize, Deserializer, Serializer};

    use super::DUE_DATE_FORMAT;

    pub fn serialize<S>(value: &Option<NaiveDate>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match value {
            Some(date) => serializer.serialize_str(&date.format(DUE_DATE_FORMAT).to_string()),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<NaiveDate>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw: Option<String> = Option::deserialize(deserializer)?;
        match raw.as_deref().map(str::trim) {
            None | Some("") => Ok(None),
            Some(value) => NaiveDate::parse_from_str(value, DUE_DATE_FORMAT)
                .map(Some)
                .map_err(serde::de::Error::custom),
        }
    }
}
