use std::{fmt, str::FromStr};

use crate::{
    tasks::{Priority, Task},
    ParseError,
};

/// Completion-state filter.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum StatusFilter {
    #[default]
    All,
    Completed,
    Pending,
}

impl StatusFilter {
    pub fn as_str(self) -> &'static str {
        match self {
            StatusFilter::All => "all",
            StatusFilter::Completed => "completed",
            StatusFilter::Pending => "pending",
        }
    }

    pub fn next(self) -> Self {
        match self {
            StatusFilter::All => StatusFilter::Completed,
            StatusFilter::Completed => StatusFilter::Pending,
            StatusFilter::Pending => StatusFilter::All,
        }
    }

    fn matches(self, task: &Task) -> bool {
        match self {
            StatusFilter::All => true,
            StatusFilter::Completed => task.completed,
            StatusFilter::Pending => !task.completed,
        }
    }
}

impl fmt::Display for StatusFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StatusFilter {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "all" => Ok(StatusFilter::All),
            "completed" | "done" => Ok(StatusFilter::Completed),
            "pending" | "todo" => Ok(StatusFilter::Pending),
            _ => Err(ParseError::new("status", s, "all, completed, pending")),
        }
    }
}

/// Active filter and search controls. `None` means "all" for priority and category.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Criteria {
    pub status: StatusFilter,
    pub priority: Option<Priority>,
    pub category: Option<String>,
    pub search: String,
}

impl Criteria {
    /// True when `task` satisfies every active criterion.
    pub fn matches(&self, task: &Task) -> bool {
        self.status.matches(task)
            && self.priority.is_none_or(|p| task.priority == p)
            && self
                .category
                .as_deref()
                .is_none_or(|c| task.has_category(c))
            && matches_search(&task.text, &self.search)
    }
}

fn matches_search(text: &str, search: &str) -> bool {
    search.is_empty() || text.to_lowercase().contains(&search.to_lowercase())
}

/// Keep the tasks matching `criteria`, in their original order.
pub fn filter_tasks<'a>(
    tasks: impl IntoIterator<Item = &'a Task>,
    criteria: &Criteria,
) -> Vec<&'a Task> {
    tasks.into_iter().filter(|t| criteria.matches(t)).collect()
}
