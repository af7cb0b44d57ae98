use anyhow::Result;
use chrono::NaiveDate;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use taskdeck_core::{
    filter::filter_tasks,
    storage::KeyValueStore,
    tasks::{Priority, TaskId, DUE_DATE_FORMAT},
    view::category_options,
};
use taskdeck_task::{Confirm, Controller};

/// Whether the event loop keeps running after a key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditorField {
    Text,
    Priority,
    DueDate,
    Completed,
    Category,
}

impl EditorField {
    const ORDER: [EditorField; 5] = [
        EditorField::Text,
        EditorField::Priority,
        EditorField::DueDate,
        EditorField::Completed,
        EditorField::Category,
    ];

    fn offset(self, by: isize) -> Self {
        let len = Self::ORDER.len() as isize;
        let idx = Self::ORDER.iter().position(|f| *f == self).unwrap_or(0) as isize;
        Self::ORDER[(idx + by).rem_euclid(len) as usize]
    }
}

/// Inputs of the edit dialog that are not part of the controller's edit buffer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditorForm {
    pub field: EditorField,
    pub due_input: String,
    pub category_input: String,
    pub error: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mode {
    Normal,
    Adding(String),
    Searching(String),
    Editing(EditorForm),
}

/// Key-driven UI state layered over the controller.
///
/// The selection indexes the currently visible (filtered) tasks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct App {
    pub mode: Mode,
    pub selected: usize,
}

impl Default for App {
    fn default() -> Self {
        Self {
            mode: Mode::Normal,
            selected: 0,
        }
    }
}

impl App {
    pub fn handle_key<S: KeyValueStore>(
        &mut self,
        key: KeyEvent,
        controller: &mut Controller<S>,
        confirm: &mut dyn Confirm,
    ) -> Result<Flow> {
        let flow = match std::mem::replace(&mut self.mode, Mode::Normal) {
            Mode::Normal => self.normal_key(key, controller, confirm)?,
            Mode::Adding(input) => {
                self.mode = Mode::Adding(input);
                self.adding_key(key, controller)?;
                Flow::Continue
            }
            Mode::Searching(input) => {
                self.mode = Mode::Searching(input);
                self.searching_key(key, controller);
                Flow::Continue
            }
            Mode::Editing(form) => {
                self.mode = Mode::Editing(form);
                self.editing_key(key, controller)?;
                Flow::Continue
            }
        };
        self.clamp_selection(controller);
        Ok(flow)
    }

    pub fn selected_id<S: KeyValueStore>(&self, controller: &Controller<S>) -> Option<TaskId> {
        visible_ids(controller).get(self.selected).copied()
    }

    fn normal_key<S: KeyValueStore>(
        &mut self,
        key: KeyEvent,
        controller: &mut Controller<S>,
        confirm: &mut dyn Confirm,
    ) -> Result<Flow> {
        let selected = self.selected_id(controller);
        match key.code {
            KeyCode::Char('q') => return Ok(Flow::Quit),
            KeyCode::Esc => {
                if controller.dragging().is_some() {
                    controller.drag_end();
                } else {
                    return Ok(Flow::Quit);
                }
            }
            KeyCode::Char('j') | KeyCode::Down => self.selected = self.selected.saturating_add(1),
            KeyCode::Char('k') | KeyCode::Up => self.selected = self.selected.saturating_sub(1),
            KeyCode::Char('a') => self.mode = Mode::Adding(String::new()),
            KeyCode::Char('/') => self.mode = Mode::Searching(controller.criteria().search.clone()),
            KeyCode::Char(' ') | KeyCode::Char('x') => {
                if let Some(id) = selected {
                    controller.toggle_complete(id)?;
                }
            }
            KeyCode::Char('e') | KeyCode::Enter => {
                if let Some(id) = selected {
                    self.open_editor(id, controller);
                }
            }
            KeyCode::Char('d') => {
                if let Some(id) = selected {
                    controller.delete_task(id, confirm)?;
                }
            }
            KeyCode::Char('s') => {
                let next = controller.criteria().status.next();
                controller.set_status_filter(next);
            }
            KeyCode::Char('p') => {
                let next = match controller.criteria().priority {
                    None => Some(Priority::Low),
                    Some(Priority::High) => None,
                    Some(p) => Some(p.next()),
                };
                controller.set_priority_filter(next);
            }
            KeyCode::Char('c') => {
                let next = next_category(controller);
                controller.set_category_filter(next);
            }
            KeyCode::Char('t') => {
                controller.toggle_theme()?;
            }
            KeyCode::Char('m') => match (controller.dragging(), selected) {
                (None, Some(id)) => {
                    controller.drag_start(id);
                }
                (Some(source), Some(target)) => {
                    controller.drop_on(target)?;
                    // Follow the dropped task to its new slot.
                    if let Some(pos) = visible_ids(controller).iter().position(|id| *id == source)
                    {
                        self.selected = pos;
                    }
                }
                (Some(_), None) => controller.drag_end(),
                (None, None) => {}
            },
            _ => {}
        }
        Ok(Flow::Continue)
    }

    fn adding_key<S: KeyValueStore>(
        &mut self,
        key: KeyEvent,
        controller: &mut Controller<S>,
    ) -> Result<()> {
        let Mode::Adding(input) = &mut self.mode else {
            return Ok(());
        };
        match key.code {
            KeyCode::Char(c) if is_plain(&key) => input.push(c),
            KeyCode::Backspace => {
                input.pop();
            }
            KeyCode::Enter => {
                let text = std::mem::take(input);
                self.mode = Mode::Normal;
                if controller.add_task(&text)?.is_some() {
                    self.selected = 0;
                }
            }
            KeyCode::Esc => self.mode = Mode::Normal,
            _ => {}
        }
        Ok(())
    }

    fn searching_key<S: KeyValueStore>(&mut self, key: KeyEvent, controller: &mut Controller<S>) {
        let Mode::Searching(input) = &mut self.mode else {
            return;
        };
        match key.code {
            KeyCode::Char(c) if is_plain(&key) => input.push(c),
            KeyCode::Backspace => {
                input.pop();
            }
            KeyCode::Enter => {
                controller.set_search(std::mem::take(input));
                self.mode = Mode::Normal;
                self.selected = 0;
            }
            KeyCode::Esc => self.mode = Mode::Normal,
            _ => {}
        }
    }

    fn open_editor<S: KeyValueStore>(&mut self, id: TaskId, controller: &mut Controller<S>) {
        if !controller.open_editor(id) {
            return;
        }
        let due_input = controller
            .editor()
            .buffer()
            .and_then(|b| b.due_date)
            .map(|d| d.format(DUE_DATE_FORMAT).to_string())
            .unwrap_or_default();
        self.mode = Mode::Editing(EditorForm {
            field: EditorField::Text,
            due_input,
            category_input: String::new(),
            error: None,
        });
    }

    fn editing_key<S: KeyValueStore>(
        &mut self,
        key: KeyEvent,
        controller: &mut Controller<S>,
    ) -> Result<()> {
        let Mode::Editing(form) = &mut self.mode else {
            return Ok(());
        };
        if key.code == KeyCode::Esc {
            controller.cancel_editor();
            self.mode = Mode::Normal;
            return Ok(());
        }
        let save = key.code == KeyCode::Char('s') && key.modifiers.contains(KeyModifiers::CONTROL);
        if save {
            return self.commit_editor(controller);
        }
        if matches!(key.code, KeyCode::Char(_)) && !is_plain(&key) {
            return Ok(());
        }
        match key.code {
            KeyCode::Tab => {
                form.field = form.field.offset(1);
                return Ok(());
            }
            KeyCode::BackTab => {
                form.field = form.field.offset(-1);
                return Ok(());
            }
            _ => {}
        }

        let field = form.field;
        match (field, key.code) {
            (EditorField::Category, KeyCode::Enter) => {
                let name = std::mem::take(&mut form.category_input);
                controller.add_editor_category(&name)?;
            }
            (EditorField::Category, KeyCode::Backspace) if form.category_input.is_empty() => {
                let last = controller
                    .editor()
                    .buffer()
                    .and_then(|b| b.categories().last().cloned());
                if let Some(last) = last {
                    controller.remove_editor_category(&last);
                }
            }
            (EditorField::Category, KeyCode::Backspace) => {
                form.category_input.pop();
            }
            (EditorField::Category, KeyCode::Char(c)) => form.category_input.push(c),
            (EditorField::DueDate, KeyCode::Char(c)) if c.is_ascii_digit() || c == '-' => {
                form.due_input.push(c);
            }
            (EditorField::DueDate, KeyCode::Backspace) => {
                form.due_input.pop();
            }
            (_, KeyCode::Enter) => return self.commit_editor(controller),
            (EditorField::Text, code) => {
                if let Some(buffer) = controller.edit_buffer_mut() {
                    match code {
                        KeyCode::Char(c) => buffer.text.push(c),
                        KeyCode::Backspace => {
                            buffer.text.pop();
                        }
                        _ => {}
                    }
                }
            }
            (EditorField::Priority, code) => {
                if let Some(buffer) = controller.edit_buffer_mut() {
                    match code {
                        KeyCode::Left => buffer.priority = buffer.priority.previous(),
                        KeyCode::Right | KeyCode::Char(' ') => {
                            buffer.priority = buffer.priority.next()
                        }
                        _ => {}
                    }
                }
            }
            (EditorField::Completed, KeyCode::Char(' ')) => {
                if let Some(buffer) = controller.edit_buffer_mut() {
                    buffer.completed = !buffer.completed;
                }
            }
            _ => {}
        }
        Ok(())
    }

    fn commit_editor<S: KeyValueStore>(&mut self, controller: &mut Controller<S>) -> Result<()> {
        let Mode::Editing(form) = &mut self.mode else {
            return Ok(());
        };
        let due = form.due_input.trim();
        let due_date = if due.is_empty() {
            None
        } else {
            match NaiveDate::parse_from_str(due, DUE_DATE_FORMAT) {
                Ok(date) => Some(date),
                Err(_) => {
                    form.error = Some("Due date must be YYYY-MM-DD".to_string());
                    form.field = EditorField::DueDate;
                    return Ok(());
                }
            }
        };
        if let Some(buffer) = controller.edit_buffer_mut() {
            buffer.due_date = due_date;
        }

        controller.save_editor()?;
        if controller.editor().is_open() {
            form.error = Some("Task text cannot be empty".to_string());
            form.field = EditorField::Text;
        } else {
            self.mode = Mode::Normal;
        }
        Ok(())
    }

    fn clamp_selection<S: KeyValueStore>(&mut self, controller: &Controller<S>) {
        let visible = visible_ids(controller).len();
        self.selected = self.selected.min(visible.saturating_sub(1));
    }
}

/// Typed characters only; chords such as Ctrl-C never land in a text field.
fn is_plain(key: &KeyEvent) -> bool {
    key.modifiers.is_empty() || key.modifiers == KeyModifiers::SHIFT
}

fn visible_ids<S: KeyValueStore>(controller: &Controller<S>) -> Vec<TaskId> {
    filter_tasks(controller.tasks(), controller.criteria())
        .into_iter()
        .map(|t| t.id)
        .collect()
}

/// `all → first category → … → last category → all`, following the board's filter options.
fn next_category<S: KeyValueStore>(controller: &Controller<S>) -> Option<String> {
    let options = category_options(controller.categories());
    let current = controller.criteria().category.as_deref();
    let next = options
        .iter()
        .position(|option| option.value.as_deref() == current)
        .map_or(0, |idx| (idx + 1) % options.len());
    options.into_iter().nth(next).and_then(|option| option.value)
}

#[cfg(test)]
mod tests {
    use taskdeck_core::{filter::StatusFilter, storage::InMemoryStore, theme::Theme};

    use super::*;

    fn press(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn type_text(app: &mut App, controller: &mut Controller<InMemoryStore>, text: &str) {
        for c in text.chars() {
            send(app, controller, press(KeyCode::Char(c)));
        }
    }

    fn send(app: &mut App, controller: &mut Controller<InMemoryStore>, key: KeyEvent) -> Flow {
        app.handle_key(key, controller, &mut |_: &str| true)
            .expect("key handled")
    }

    fn setup(texts: &[&str]) -> (App, Controller<InMemoryStore>) {
        let mut controller = Controller::load(InMemoryStore::new()).expect("load");
        for text in texts.iter().rev() {
            controller.add_task(text).expect("add");
        }
        (App::default(), controller)
    }

    fn texts(controller: &Controller<InMemoryStore>) -> Vec<String> {
        controller.tasks().iter().map(|t| t.text.clone()).collect()
    }

    #[test]
    fn typing_a_new_task_adds_it_at_the_top() {
        let (mut app, mut controller) = setup(&["old"]);
        send(&mut app, &mut controller, press(KeyCode::Char('a')));
        type_text(&mut app, &mut controller, "Buy milk");
        send(&mut app, &mut controller, press(KeyCode::Enter));

        assert_eq!(app.mode, Mode::Normal);
        assert_eq!(texts(&controller), vec!["Buy milk", "old"]);
        assert_eq!(app.selected, 0);
    }

    #[test]
    fn quit_keys_stop_the_loop() {
        let (mut app, mut controller) = setup(&[]);
        assert_eq!(send(&mut app, &mut controller, press(KeyCode::Char('q'))), Flow::Quit);
        assert_eq!(send(&mut app, &mut controller, press(KeyCode::Esc)), Flow::Quit);
    }

    #[test]
    fn selection_is_clamped_to_visible_tasks() {
        let (mut app, mut controller) = setup(&["a", "b"]);
        for _ in 0..5 {
            send(&mut app, &mut controller, press(KeyCode::Char('j')));
        }
        assert_eq!(app.selected, 1);
        send(&mut app, &mut controller, press(KeyCode::Char('s')));
        send(&mut app, &mut controller, press(KeyCode::Char('s')));
        assert_eq!(controller.criteria().status, StatusFilter::Pending);
        assert_eq!(app.selected, 1);
    }

    #[test]
    fn delete_asks_before_removing() {
        let (mut app, mut controller) = setup(&["a", "b"]);
        let mut asked = 0;
        app.handle_key(press(KeyCode::Char('d')), &mut controller, &mut |_: &str| {
            asked += 1;
            false
        })
        .expect("key");
        assert_eq!(asked, 1);
        assert_eq!(controller.tasks().len(), 2);

        send(&mut app, &mut controller, press(KeyCode::Char('d')));
        assert_eq!(texts(&controller), vec!["b"]);
    }

    #[test]
    fn pick_up_and_drop_moves_the_task() {
        let (mut app, mut controller) = setup(&["a", "b", "c"]);
        send(&mut app, &mut controller, press(KeyCode::Char('m')));
        send(&mut app, &mut controller, press(KeyCode::Char('j')));
        send(&mut app, &mut controller, press(KeyCode::Char('j')));
        send(&mut app, &mut controller, press(KeyCode::Char('m')));

        assert_eq!(texts(&controller), vec!["b", "c", "a"]);
        assert_eq!(controller.dragging(), None);
    }

    #[test]
    fn escape_cancels_a_pending_drag_before_quitting() {
        let (mut app, mut controller) = setup(&["a"]);
        send(&mut app, &mut controller, press(KeyCode::Char('m')));
        assert!(controller.dragging().is_some());
        assert_eq!(send(&mut app, &mut controller, press(KeyCode::Esc)), Flow::Continue);
        assert_eq!(controller.dragging(), None);
    }

    #[test]
    fn editor_updates_fields_and_saves() {
        let (mut app, mut controller) = setup(&["Pay rent"]);
        send(&mut app, &mut controller, press(KeyCode::Char('e')));
        assert!(matches!(app.mode, Mode::Editing(_)));

        type_text(&mut app, &mut controller, "!");
        send(&mut app, &mut controller, press(KeyCode::Tab));
        send(&mut app, &mut controller, press(KeyCode::Right));
        send(&mut app, &mut controller, press(KeyCode::Tab));
        type_text(&mut app, &mut controller, "2025-01-05");
        send(&mut app, &mut controller, press(KeyCode::Tab));
        send(&mut app, &mut controller, press(KeyCode::Char(' ')));
        send(&mut app, &mut controller, press(KeyCode::Tab));
        type_text(&mut app, &mut controller, "Home");
        send(&mut app, &mut controller, press(KeyCode::Enter));
        send(
            &mut app,
            &mut controller,
            KeyEvent::new(KeyCode::Char('s'), KeyModifiers::CONTROL),
        );

        assert_eq!(app.mode, Mode::Normal);
        let task = &controller.tasks().as_slice()[0];
        assert_eq!(task.text, "Pay rent!");
        assert_eq!(task.priority, Priority::High);
        assert_eq!(task.due_date, NaiveDate::from_ymd_opt(2025, 1, 5));
        assert!(task.completed);
        assert_eq!(task.categories, vec!["Home".to_string()]);
    }

    #[test]
    fn editor_keeps_invalid_due_date_open() {
        let (mut app, mut controller) = setup(&["Pay rent"]);
        send(&mut app, &mut controller, press(KeyCode::Char('e')));
        send(&mut app, &mut controller, press(KeyCode::Tab));
        send(&mut app, &mut controller, press(KeyCode::Tab));
        type_text(&mut app, &mut controller, "2025-13-40");
        send(&mut app, &mut controller, press(KeyCode::Enter));

        let Mode::Editing(form) = &app.mode else {
            panic!("editor should stay open");
        };
        assert_eq!(form.error.as_deref(), Some("Due date must be YYYY-MM-DD"));
        assert_eq!(controller.tasks().as_slice()[0].due_date, None);

        send(&mut app, &mut controller, press(KeyCode::Esc));
        assert_eq!(app.mode, Mode::Normal);
        assert!(!controller.editor().is_open());
    }

    #[test]
    fn search_and_filters_cycle() {
        let (mut app, mut controller) = setup(&["Buy milk", "Pay rent"]);
        send(&mut app, &mut controller, press(KeyCode::Char('/')));
        type_text(&mut app, &mut controller, "MIL");
        send(&mut app, &mut controller, press(KeyCode::Enter));
        assert_eq!(controller.criteria().search, "MIL");
        assert_eq!(visible_ids(&controller).len(), 1);

        send(&mut app, &mut controller, press(KeyCode::Char('p')));
        assert_eq!(controller.criteria().priority, Some(Priority::Low));
        send(&mut app, &mut controller, press(KeyCode::Char('c')));
        assert_eq!(controller.criteria().category.as_deref(), Some("Work"));
        for _ in 0..3 {
            send(&mut app, &mut controller, press(KeyCode::Char('c')));
        }
        assert_eq!(controller.criteria().category, None);
    }

    #[test]
    fn theme_key_flips_the_theme() {
        let (mut app, mut controller) = setup(&[]);
        send(&mut app, &mut controller, press(KeyCode::Char('t')));
        assert_eq!(controller.theme(), Theme::Dark);
    }

    #[test]
    fn control_chords_do_not_type_into_fields() {
        let (mut app, mut controller) = setup(&["Pay rent"]);
        send(&mut app, &mut controller, press(KeyCode::Char('e')));
        send(
            &mut app,
            &mut controller,
            KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL),
        );
        send(
            &mut app,
            &mut controller,
            KeyEvent::new(KeyCode::Char('R'), KeyModifiers::SHIFT),
        );
        assert_eq!(
            controller.editor().buffer().map(|b| b.text.as_str()),
            Some("Pay rentR")
        );
        send(&mut app, &mut controller, press(KeyCode::Esc));

        send(&mut app, &mut controller, press(KeyCode::Char('a')));
        send(
            &mut app,
            &mut controller,
            KeyEvent::new(KeyCode::Char('x'), KeyModifiers::ALT),
        );
        assert_eq!(app.mode, Mode::Adding(String::new()));
    }
}
