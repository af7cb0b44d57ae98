use anyhow::Result;
use chrono::{DateTime, NaiveDate, Utc};
use taskdeck_core::{
    categories::CategoryList,
    filter::{Criteria, StatusFilter},
    storage::KeyValueStore,
    tasks::{Priority, TaskCollection, TaskId, TaskStats},
    theme::Theme,
    view::{render_board, BoardView},
};
use tracing::{debug, instrument};

use crate::{
    edit::{EditBuffer, EditState},
    repo::TaskRepo,
};

pub const DELETE_PROMPT: &str = "Are you sure you want to delete this task?";

/// Synchronous yes/no prompt. Blocks the caller until the user answers.
pub trait Confirm {
    fn confirm(&mut self, message: &str) -> bool;
}

impl<F> Confirm for F
where
    F: FnMut(&str) -> bool,
{
    fn confirm(&mut self, message: &str) -> bool {
        self(message)
    }
}

/// Application state plus the handlers that mutate it.
///
/// Each handler runs to completion: it mutates the in-memory state and, when
/// something changed, writes the affected blob before returning. Handlers
/// return `Ok(false)` for ignored input (unknown id, blank text) and only fail
/// when the store cannot be written.
pub struct Controller<S: KeyValueStore> {
    repo: TaskRepo<S>,
    tasks: TaskCollection,
    categories: CategoryList,
    theme: Theme,
    criteria: Criteria,
    editor: EditState,
    dragging: Option<TaskId>,
}

impl<S: KeyValueStore> Controller<S> {
    /// Read the persisted state. Categories used by stored tasks but missing
    /// from the global list are added to it in memory.
    #[instrument(skip_all)]
    pub fn load(store: S) -> Result<Self> {
        let repo = TaskRepo::new(store);
        let snapshot = repo.load()?;
        let mut categories = snapshot.categories;
        categories.absorb(&snapshot.tasks);
        debug!(tasks = snapshot.tasks.len(), theme = %snapshot.theme, "state loaded");
        Ok(Self {
            repo,
            tasks: snapshot.tasks,
            categories,
            theme: snapshot.theme,
            criteria: Criteria::default(),
            editor: EditState::Closed,
            dragging: None,
        })
    }

    pub fn tasks(&self) -> &TaskCollection {
        &self.tasks
    }

    pub fn categories(&self) -> &CategoryList {
        &self.categories
    }

    pub fn theme(&self) -> Theme {
        self.theme
    }

    pub fn stats(&self) -> TaskStats {
        self.tasks.stats()
    }

    pub fn store(&self) -> &S {
        self.repo.store()
    }

    pub fn view(&self, today: NaiveDate) -> BoardView {
        render_board(
            &self.tasks,
            &self.categories,
            &self.criteria,
            today,
            self.dragging,
        )
    }

    // Filter controls. Criteria are transient and never persisted.

    pub fn criteria(&self) -> &Criteria {
        &self.criteria
    }

    pub fn set_criteria(&mut self, criteria: Criteria) {
        self.criteria = criteria;
    }

    pub fn set_status_filter(&mut self, status: StatusFilter) {
        self.criteria.status = status;
    }

    pub fn set_priority_filter(&mut self, priority: Option<Priority>) {
        self.criteria.priority = priority;
    }

    pub fn set_category_filter(&mut self, category: Option<String>) {
        self.criteria.category = category;
    }

    pub fn set_search(&mut self, search: impl Into<String>) {
        self.criteria.search = search.into();
    }

    // Task mutations.

    pub fn add_task(&mut self, text: &str) -> Result<Option<TaskId>> {
        self.add_task_at(text, Utc::now())
    }

    pub fn add_task_at(&mut self, text: &str, now: DateTime<Utc>) -> Result<Option<TaskId>> {
        let Some(id) = self.tasks.add(text, now) else {
            return Ok(None);
        };
        debug!(id, "task added");
        self.persist_tasks()?;
        Ok(Some(id))
    }

    pub fn toggle_complete(&mut self, id: TaskId) -> Result<bool> {
        if !self.tasks.toggle_complete(id) {
            return Ok(false);
        }
        debug!(id, "completion toggled");
        self.persist_tasks()?;
        Ok(true)
    }

    /// Ask `confirm` first; unknown ids return without prompting.
    pub fn delete_task(&mut self, id: TaskId, confirm: &mut dyn Confirm) -> Result<bool> {
        if self.tasks.get(id).is_none() {
            return Ok(false);
        }
        if !confirm.confirm(DELETE_PROMPT) {
            debug!(id, "delete declined");
            return Ok(false);
        }
        self.tasks.remove(id);
        if self.dragging == Some(id) {
            self.dragging = None;
        }
        debug!(id, "task deleted");
        self.persist_tasks()?;
        Ok(true)
    }

    /// Relocate `source` to the position of `target` (splice semantics).
    pub fn move_task(&mut self, source: TaskId, target: TaskId) -> Result<bool> {
        if !self.tasks.reorder(source, target) {
            return Ok(false);
        }
        debug!(source, target, "task moved");
        self.persist_tasks()?;
        Ok(true)
    }

    // Edit flow.

    pub fn editor(&self) -> &EditState {
        &self.editor
    }

    pub fn edit_buffer_mut(&mut self) -> Option<&mut EditBuffer> {
        self.editor.buffer_mut()
    }

    /// Enter `Editing(id)` with a snapshot of the task. Replaces any open buffer.
    pub fn open_editor(&mut self, id: TaskId) -> bool {
        let Some(task) = self.tasks.get(id) else {
            return false;
        };
        self.editor = EditState::Editing(EditBuffer::from_task(task));
        true
    }

    /// Add a category to the working set. A name new to the global list is
    /// appended there and persisted right away, even if the edit is cancelled.
    pub fn add_editor_category(&mut self, name: &str) -> Result<bool> {
        let Some(buffer) = self.editor.buffer_mut() else {
            return Ok(false);
        };
        let Some(added) = buffer.add_category(name) else {
            return Ok(false);
        };
        if self.categories.insert(&added) {
            debug!(category = %added, "category registered");
            self.repo.save_categories(&self.categories)?;
        }
        Ok(true)
    }

    pub fn remove_editor_category(&mut self, name: &str) -> bool {
        self.editor
            .buffer_mut()
            .is_some_and(|buffer| buffer.remove_category(name))
    }

    /// Commit the buffer onto its task and close the editor.
    ///
    /// Blank text is rejected and leaves the editor open. If the task is gone
    /// the editor closes without changes.
    pub fn save_editor(&mut self) -> Result<bool> {
        let Some(buffer) = self.editor.buffer() else {
            return Ok(false);
        };
        if buffer.text.trim().is_empty() {
            return Ok(false);
        }
        let id = buffer.task_id();
        let updated = self.tasks.update(id, buffer.to_update());
        self.editor = EditState::Closed;
        if updated {
            debug!(id, "task saved from editor");
            self.persist_tasks()?;
        }
        Ok(updated)
    }

    pub fn cancel_editor(&mut self) {
        self.editor = EditState::Closed;
    }

    // Drag-to-reorder.

    pub fn dragging(&self) -> Option<TaskId> {
        self.dragging
    }

    pub fn drag_start(&mut self, id: TaskId) -> bool {
        if self.tasks.get(id).is_none() {
            return false;
        }
        self.dragging = Some(id);
        true
    }

    /// Drop the dragged task onto `target`. Dropping onto itself only ends the drag.
    pub fn drop_on(&mut self, target: TaskId) -> Result<bool> {
        let Some(source) = self.dragging.take() else {
            return Ok(false);
        };
        if source == target {
            return Ok(false);
        }
        self.move_task(source, target)
    }

    pub fn drag_end(&mut self) {
        self.dragging = None;
    }

    // Theme.

    pub fn toggle_theme(&mut self) -> Result<Theme> {
        self.theme = self.theme.toggled();
        debug!(theme = %self.theme, "theme toggled");
        self.repo.save_theme(self.theme)?;
        Ok(self.theme)
    }

    fn persist_tasks(&self) -> Result<()> {
        self.repo.save_tasks(&self.tasks)
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;
    use taskdeck_core::{
        storage::{InMemoryStore, StoreError},
        view::TaskListView,
    };

    use super::*;

    fn at(ms: i64) -> DateTime<Utc> {
        Utc.timestamp_millis_opt(ms).single().expect("timestamp")
    }

    fn controller() -> Controller<InMemoryStore> {
        Controller::load(InMemoryStore::new()).expect("load")
    }

    fn seeded(texts: &[&str]) -> (Controller<InMemoryStore>, Vec<TaskId>) {
        let mut ctl = controller();
        for (offset, text) in texts.iter().rev().enumerate() {
            ctl.add_task_at(text, at(1_000 + offset as i64)).expect("add");
        }
        let ids = ctl.tasks().iter().map(|t| t.id).collect();
        (ctl, ids)
    }

    fn texts(ctl: &Controller<InMemoryStore>) -> Vec<String> {
        ctl.tasks().iter().map(|t| t.text.clone()).collect()
    }

    fn reloaded(ctl: &Controller<InMemoryStore>) -> Controller<InMemoryStore> {
        Controller::load(ctl.store().clone()).expect("reload")
    }

    #[test]
    fn every_mutation_is_flushed() {
        let (mut ctl, ids) = seeded(&["a", "b"]);
        ctl.toggle_complete(ids[0]).expect("toggle");
        ctl.move_task(ids[0], ids[1]).expect("move");

        assert_eq!(reloaded(&ctl).tasks(), ctl.tasks());
    }

    #[test]
    fn blank_add_writes_nothing() {
        let mut ctl = controller();
        assert_eq!(ctl.add_task("   ").expect("add"), None);
        let err = ctl.store().get("tasks").expect_err("nothing stored");
        assert!(matches!(err, StoreError::NotFound { .. }));
    }

    #[test]
    fn delete_requires_confirmation() {
        let (mut ctl, ids) = seeded(&["a", "b"]);
        let mut prompts = Vec::new();

        let deleted = ctl
            .delete_task(ids[0], &mut |msg: &str| {
                prompts.push(msg.to_string());
                false
            })
            .expect("delete");
        assert!(!deleted);
        assert_eq!(ctl.tasks().len(), 2);
        assert_eq!(prompts, vec![DELETE_PROMPT.to_string()]);

        assert!(ctl.delete_task(ids[0], &mut |_: &str| true).expect("delete"));
        assert_eq!(texts(&ctl), vec!["b"]);
        assert_eq!(texts(&reloaded(&ctl)), vec!["b"]);
    }

    #[test]
    fn deleting_unknown_id_does_not_prompt() {
        let (mut ctl, _) = seeded(&["a"]);
        let mut asked = false;
        let deleted = ctl
            .delete_task(42, &mut |_: &str| {
                asked = true;
                true
            })
            .expect("delete");
        assert!(!deleted);
        assert!(!asked);
        assert_eq!(ctl.tasks().len(), 1);
    }

    #[test]
    fn editor_save_commits_the_buffer() {
        let (mut ctl, ids) = seeded(&["Plan trip"]);
        assert!(ctl.open_editor(ids[0]));

        let buffer = ctl.edit_buffer_mut().expect("editing");
        buffer.text = "Plan summer trip".into();
        buffer.priority = Priority::High;
        buffer.completed = true;
        assert!(ctl.add_editor_category("Travel").expect("category"));

        assert!(ctl.save_editor().expect("save"));
        assert_eq!(ctl.editor(), &EditState::Closed);

        let task = ctl.tasks().get(ids[0]).expect("task");
        assert_eq!(task.text, "Plan summer trip");
        assert_eq!(task.priority, Priority::High);
        assert!(task.completed);
        assert_eq!(task.categories, vec!["Travel".to_string()]);
        assert_eq!(reloaded(&ctl).tasks(), ctl.tasks());
    }

    #[test]
    fn editor_cancel_discards_changes_but_keeps_new_categories() {
        let (mut ctl, ids) = seeded(&["Plan trip"]);
        let before = ctl.tasks().clone();
        ctl.open_editor(ids[0]);
        ctl.edit_buffer_mut().expect("editing").text = "changed".into();
        ctl.add_editor_category("Garden").expect("category");
        ctl.cancel_editor();

        assert_eq!(ctl.tasks(), &before);
        assert!(!ctl.editor().is_open());
        assert!(ctl.categories().contains("Garden"));
        assert!(reloaded(&ctl).categories().contains("Garden"));
    }

    #[test]
    fn editor_rejects_blank_text_and_stays_open() {
        let (mut ctl, ids) = seeded(&["Plan trip"]);
        ctl.open_editor(ids[0]);
        ctl.edit_buffer_mut().expect("editing").text = "   ".into();

        assert!(!ctl.save_editor().expect("save"));
        assert!(ctl.editor().is_open());
        assert_eq!(texts(&ctl), vec!["Plan trip"]);
    }

    #[test]
    fn duplicate_editor_category_is_ignored() {
        let (mut ctl, ids) = seeded(&["a"]);
        ctl.open_editor(ids[0]);
        assert!(ctl.add_editor_category("Work").expect("add"));
        assert!(!ctl.add_editor_category("Work").expect("add again"));
        assert!(!ctl.add_editor_category(" ").expect("blank"));
        assert_eq!(ctl.categories(), &CategoryList::default());

        assert!(ctl.remove_editor_category("Work"));
        assert!(ctl.editor().buffer().expect("open").categories().is_empty());
    }

    #[test]
    fn editor_on_unknown_task_stays_closed() {
        let mut ctl = controller();
        assert!(!ctl.open_editor(42));
        assert!(!ctl.add_editor_category("Work").expect("add"));
        assert!(!ctl.save_editor().expect("save"));
    }

    #[test]
    fn drop_relocates_dragged_task() {
        let (mut ctl, ids) = seeded(&["a", "b", "c"]);
        assert!(ctl.drag_start(ids[0]));
        assert_eq!(ctl.dragging(), Some(ids[0]));

        assert!(ctl.drop_on(ids[2]).expect("drop"));
        assert_eq!(texts(&ctl), vec!["b", "c", "a"]);
        assert_eq!(ctl.dragging(), None);
        assert_eq!(texts(&reloaded(&ctl)), vec!["b", "c", "a"]);
    }

    #[test]
    fn drop_on_self_or_without_drag_is_ignored() {
        let (mut ctl, ids) = seeded(&["a", "b"]);
        assert!(!ctl.drop_on(ids[1]).expect("drop"));

        ctl.drag_start(ids[1]);
        assert!(!ctl.drop_on(ids[1]).expect("drop"));
        assert_eq!(texts(&ctl), vec!["a", "b"]);

        ctl.drag_start(ids[1]);
        ctl.drag_end();
        assert_eq!(ctl.dragging(), None);
    }

    #[test]
    fn view_applies_criteria() {
        let (mut ctl, _) = seeded(&["Buy milk", "Pay rent"]);
        ctl.set_search("mil");
        let board = ctl.view(NaiveDate::from_ymd_opt(2025, 1, 1).expect("date"));
        assert_eq!(board.list.items().len(), 1);
        assert_eq!(board.list.items()[0].text, "Buy milk");
        assert_eq!(board.stats.total, 2);

        ctl.set_status_filter(StatusFilter::Completed);
        let board = ctl.view(NaiveDate::from_ymd_opt(2025, 1, 1).expect("date"));
        assert!(matches!(board.list, TaskListView::Empty(_)));
    }

    #[test]
    fn theme_toggle_persists() {
        let mut ctl = controller();
        assert_eq!(ctl.toggle_theme().expect("toggle"), Theme::Dark);
        assert_eq!(reloaded(&ctl).theme(), Theme::Dark);
    }

    #[test]
    fn load_registers_categories_used_by_stored_tasks() {
        let (mut ctl, ids) = seeded(&["a"]);
        ctl.open_editor(ids[0]);
        ctl.add_editor_category("Garden").expect("category");
        ctl.save_editor().expect("save");
        // Simulate a category list written before "Garden" existed.
        ctl.store()
            .put("categories", r#"["Work"]"#)
            .expect("overwrite categories");

        let fresh = reloaded(&ctl);
        assert_eq!(fresh.categories().as_slice(), ["Work", "Garden"]);
    }
}
