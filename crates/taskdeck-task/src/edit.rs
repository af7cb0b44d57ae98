use chrono::NaiveDate;
use taskdeck_core::tasks::{Priority, Task, TaskId, TaskUpdate};

/// Working copy of a task while the editor is open.
///
/// Field edits stay here until the controller commits them; the category set
/// keeps insertion order and never holds duplicates or blank names.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditBuffer {
    task_id: TaskId,
    pub text: String,
    pub priority: Priority,
    pub due_date: Option<NaiveDate>,
    pub completed: bool,
    categories: Vec<String>,
}

impl EditBuffer {
    pub fn from_task(task: &Task) -> Self {
        Self {
            task_id: task.id,
            text: task.text.clone(),
            priority: task.priority,
            due_date: task.due_date,
            completed: task.completed,
            categories: task.categories.clone(),
        }
    }

    pub fn task_id(&self) -> TaskId {
        self.task_id
    }

    pub fn categories(&self) -> &[String] {
        &self.categories
    }

    /// Adds the trimmed name and returns it, or `None` if blank or already present.
    pub fn add_category(&mut self, name: &str) -> Option<String> {
        let name = name.trim();
        if name.is_empty() || self.categories.iter().any(|c| c == name) {
            return None;
        }
        self.categories.push(name.to_string());
        Some(name.to_string())
    }

    pub fn remove_category(&mut self, name: &str) -> bool {
        let before = self.categories.len();
        self.categories.retain(|c| c != name);
        self.categories.len() != before
    }

    pub fn to_update(&self) -> TaskUpdate {
        TaskUpdate {
            text: self.text.clone(),
            priority: self.priority,
            due_date: self.due_date,
            categories: self.categories.clone(),
            completed: self.completed,
        }
    }
}

/// `Closed → Editing(task) → Closed`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum EditState {
    #[default]
    Closed,
    Editing(EditBuffer),
}

impl EditState {
    pub fn is_open(&self) -> bool {
        matches!(self, EditState::Editing(_))
    }

    pub fn buffer(&self) -> Option<&EditBuffer> {
        match self {
            EditState::Editing(buffer) => Some(buffer),
            EditState::Closed => None,
        }
    }

    pub fn buffer_mut(&mut self) -> Option<&mut EditBuffer> {
        match self {
            EditState::Editing(buffer) => Some(buffer),
            EditState::Closed => None,
        }
    }
}
