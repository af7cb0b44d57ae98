//! Typed projection of the task list for whichever surface draws it.
//!
//! Rendering is a pure function of the collection, the criteria and "today";
//! surfaces redraw the whole list from a fresh [`BoardView`] after every change.

use chrono::NaiveDate;

use crate::{
    categories::CategoryList,
    filter::{filter_tasks, Criteria},
    tasks::{Priority, Task, TaskCollection, TaskId, TaskStats},
};

/// Placeholder shown when no task survives the filters.
pub const EMPTY_STATE: EmptyState = EmptyState {
    title: "No tasks found",
    hint: "Try changing your filters or add a new task",
};

/// Per-item affordances, in display order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskAction {
    Toggle,
    Edit,
    Delete,
}

pub const TASK_ACTIONS: [TaskAction; 3] = [TaskAction::Toggle, TaskAction::Edit, TaskAction::Delete];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DueDateView {
    pub date: NaiveDate,
    /// Display form, e.g. `Jan 5, 2025`.
    pub label: String,
    pub overdue: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskView {
    pub id: TaskId,
    pub text: String,
    pub completed: bool,
    pub priority: Priority,
    pub due: Option<DueDateView>,
    /// First category only; the list view has room for a single tag.
    pub category: Option<String>,
    pub actions: [TaskAction; 3],
    pub dragging: bool,
}

impl TaskView {
    pub fn priority_badge(&self) -> &'static str {
        self.priority.as_str()
    }

    pub fn is_overdue(&self) -> bool {
        self.due.as_ref().is_some_and(|d| d.overdue)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EmptyState {
    pub title: &'static str,
    pub hint: &'static str,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskListView {
    Empty(EmptyState),
    Items(Vec<TaskView>),
}

impl TaskListView {
    pub fn items(&self) -> &[TaskView] {
        match self {
            TaskListView::Empty(_) => &[],
            TaskListView::Items(items) => items.as_slice(),
        }
    }
}

/// Entry of the category filter dropdown. `value == None` stands for "all".
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterOption {
    pub value: Option<String>,
    pub label: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoardView {
    pub list: TaskListView,
    pub stats: TaskStats,
    pub category_options: Vec<FilterOption>,
}

/// Due strictly before `today` and not yet completed.
pub fn is_overdue(task: &Task, today: NaiveDate) -> bool {
    !task.completed && task.due_date.is_some_and(|due| due < today)
}

pub fn format_due_date(date: NaiveDate) -> String {
    date.format("%b %-d, %Y").to_string()
}

pub fn task_view(task: &Task, today: NaiveDate, dragging: Option<TaskId>) -> TaskView {
    TaskView {
        id: task.id,
        text: task.text.clone(),
        completed: task.completed,
        priority: task.priority,
        due: task.due_date.map(|date| DueDateView {
            date,
            label: format_due_date(date),
            overdue: is_overdue(task, today),
        }),
        category: task.categories.first().cloned(),
        actions: TASK_ACTIONS,
        dragging: dragging == Some(task.id),
    }
}

pub fn render_list(
    tasks: &TaskCollection,
    criteria: &Criteria,
    today: NaiveDate,
    dragging: Option<TaskId>,
) -> TaskListView {
    let items: Vec<TaskView> = filter_tasks(tasks, criteria)
        .into_iter()
        .map(|task| task_view(task, today, dragging))
        .collect();
    if items.is_empty() {
        TaskListView::Empty(EMPTY_STATE)
    } else {
        TaskListView::Items(items)
    }
}

pub fn category_options(categories: &CategoryList) -> Vec<FilterOption> {
    std::iter::once(FilterOption {
        value: None,
        label: "All Categories".to_string(),
    })
    .chain(categories.iter().map(|name| FilterOption {
        value: Some(name.clone()),
        label: name.clone(),
    }))
    .collect()
}

pub fn render_board(
    tasks: &TaskCollection,
    categories: &CategoryList,
    criteria: &Criteria,
    today: NaiveDate,
    dragging: Option<TaskId>,
) -> BoardView {
    BoardView {
        list: render_list(tasks, criteria, today, dragging),
        stats: tasks.stats(),
        category_options: category_options(categories),
    }
}
