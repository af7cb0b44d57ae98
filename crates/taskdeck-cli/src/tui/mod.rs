mod app;

use std::io;

use chrono::{Local, NaiveDate};
use color_eyre::Result;
use crossterm::{
    event::{self, DisableMouseCapture, Event, KeyCode, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, BorderType, Borders, Clear, List, ListItem, ListState, Paragraph},
    Frame, Terminal,
};
use taskdeck_core::{
    storage::KeyValueStore,
    tasks::Priority,
    theme::Theme,
    view::{FilterOption, TaskAction, TaskListView, TaskView},
};
use taskdeck_task::{Confirm, Controller};
use tracing::debug;

use crate::tasks::report;
use app::{App, EditorField, EditorForm, Flow, Mode};

type Backend = CrosstermBackend<io::Stdout>;

/// Interactive board. Redraws the full view after every key press; `q` exits.
pub fn launch<S: KeyValueStore>(mut controller: Controller<S>) -> Result<()> {
    // Guard restores the terminal even if we early-return.
    let guard = TerminalGuard::enter()?;
    let mut terminal = guard.terminal()?;
    let mut app = App::default();

    loop {
        let today = Local::now().date_naive();
        terminal.draw(|frame| draw(frame, &app, &controller, today))?;

        let Event::Key(key) = event::read()? else {
            continue;
        };
        if key.kind != KeyEventKind::Press {
            continue;
        }
        let mut confirm = TerminalConfirm {
            terminal: &mut terminal,
            palette: Palette::for_theme(controller.theme()),
        };
        let flow = app
            .handle_key(key, &mut controller, &mut confirm)
            .map_err(report)?;
        if flow == Flow::Quit {
            break;
        }
    }

    Ok(())
}

#[derive(Debug, Clone, Copy)]
struct Palette {
    base: Style,
    accent: Color,
    muted: Color,
    danger: Color,
}

impl Palette {
    fn for_theme(theme: Theme) -> Self {
        match theme {
            Theme::Light => Self {
                base: Style::default().fg(Color::Black).bg(Color::White),
                accent: Color::Blue,
                muted: Color::DarkGray,
                danger: Color::Red,
            },
            Theme::Dark => Self {
                base: Style::default().fg(Color::White).bg(Color::Black),
                accent: Color::Cyan,
                muted: Color::Gray,
                danger: Color::LightRed,
            },
        }
    }

    fn priority(&self, priority: Priority) -> Color {
        match priority {
            Priority::Low => Color::Green,
            Priority::Medium => Color::Yellow,
            Priority::High => self.danger,
        }
    }
}

fn draw<S: KeyValueStore>(frame: &mut Frame, app: &App, controller: &Controller<S>, today: NaiveDate) {
    let palette = Palette::for_theme(controller.theme());
    let board = controller.view(today);
    frame.render_widget(Block::default().style(palette.base), frame.area());

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .margin(1)
        .constraints([
            Constraint::Length(4),
            Constraint::Min(1),
            Constraint::Length(3),
        ])
        .split(frame.area());

    let criteria = controller.criteria();
    let header = Paragraph::new(vec![
        Line::from(vec![
            Span::styled(
                "taskdeck",
                Style::default()
                    .fg(palette.accent)
                    .add_modifier(Modifier::BOLD),
            ),
            Span::raw(format!(
                "  total {}  completed {}  pending {}",
                board.stats.total, board.stats.completed, board.stats.pending
            )),
        ]),
        Line::from(Span::styled(
            format!(
                "status: {}  priority: {}  category: {}  search: {}",
                criteria.status,
                criteria.priority.map_or("all", Priority::as_str),
                category_label(&board.category_options, criteria.category.as_deref()),
                if criteria.search.is_empty() {
                    "-"
                } else {
                    criteria.search.as_str()
                },
            ),
            Style::default().fg(palette.muted),
        )),
    ])
    .block(
        Block::default()
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded),
    );
    frame.render_widget(header, chunks[0]);

    match &board.list {
        TaskListView::Empty(empty) => {
            let body = Paragraph::new(vec![
                Line::from(Span::styled(
                    empty.title,
                    Style::default().add_modifier(Modifier::BOLD),
                )),
                Line::from(Span::styled(empty.hint, Style::default().fg(palette.muted))),
            ])
            .block(Block::default().borders(Borders::ALL).title("Tasks"));
            frame.render_widget(body, chunks[1]);
        }
        TaskListView::Items(items) => {
            let rows: Vec<ListItem> = items.iter().map(|item| task_row(item, &palette)).collect();
            let list = List::new(rows)
                .block(Block::default().borders(Borders::ALL).title("Tasks"))
                .highlight_style(Style::default().add_modifier(Modifier::REVERSED))
                .highlight_symbol("> ");
            let mut state = ListState::default().with_selected(Some(app.selected));
            frame.render_stateful_widget(list, chunks[1], &mut state);
        }
    }

    let footer = match &app.mode {
        Mode::Adding(input) => input_line("New task: ", input, &palette),
        Mode::Searching(input) => input_line("Search: ", input, &palette),
        _ if controller.dragging().is_some() => Line::from(Span::styled(
            "Moving: select a target and press m to drop, Esc to cancel",
            Style::default().fg(palette.accent),
        )),
        _ => {
            let mut hints: Vec<&str> = vec!["a add"];
            if let Some(item) = board.list.items().get(app.selected) {
                hints.extend(item.actions.iter().map(|action| action_hint(*action)));
                hints.push("m move");
            }
            hints.extend(["/ search", "s/p/c filters", "t theme", "q quit"]);
            Line::from(Span::styled(
                hints.join("  "),
                Style::default().fg(palette.muted),
            ))
        }
    };
    frame.render_widget(
        Paragraph::new(footer).block(Block::default().borders(Borders::ALL).title("Controls")),
        chunks[2],
    );

    if let Mode::Editing(form) = &app.mode {
        draw_editor(frame, form, controller, &palette);
    }
}

fn action_hint(action: TaskAction) -> &'static str {
    match action {
        TaskAction::Toggle => "space toggle",
        TaskAction::Edit => "e edit",
        TaskAction::Delete => "d delete",
    }
}

fn category_label<'a>(options: &'a [FilterOption], current: Option<&str>) -> &'a str {
    options
        .iter()
        .find(|option| option.value.as_deref() == current)
        .or_else(|| options.first())
        .map_or("", |option| option.label.as_str())
}

fn task_row<'a>(item: &'a TaskView, palette: &Palette) -> ListItem<'a> {
    let check = if item.completed { "[x] " } else { "[ ] " };
    let text_style = if item.completed {
        Style::default()
            .fg(palette.muted)
            .add_modifier(Modifier::CROSSED_OUT)
    } else {
        Style::default()
    };
    let mut spans = vec![
        Span::raw(if item.dragging { "» " } else { "" }),
        Span::raw(check),
        Span::styled(item.text.as_str(), text_style),
        Span::raw("  "),
        Span::styled(
            item.priority_badge(),
            Style::default()
                .fg(palette.priority(item.priority))
                .add_modifier(Modifier::BOLD),
        ),
    ];
    if let Some(due) = &item.due {
        let style = if due.overdue {
            Style::default()
                .fg(palette.danger)
                .add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(palette.muted)
        };
        let label = if due.overdue {
            format!("  due {} (overdue)", due.label)
        } else {
            format!("  due {}", due.label)
        };
        spans.push(Span::styled(label, style));
    }
    if let Some(category) = &item.category {
        spans.push(Span::styled(
            format!("  #{category}"),
            Style::default().fg(palette.accent),
        ));
    }
    let row = ListItem::new(Line::from(spans));
    if item.dragging {
        row.style(Style::default().add_modifier(Modifier::ITALIC))
    } else {
        row
    }
}

fn input_line<'a>(label: &'a str, input: &'a str, palette: &Palette) -> Line<'a> {
    Line::from(vec![
        Span::styled(label, Style::default().fg(palette.accent)),
        Span::raw(input),
        Span::styled("_", Style::default().add_modifier(Modifier::SLOW_BLINK)),
    ])
}

fn draw_editor<S: KeyValueStore>(
    frame: &mut Frame,
    form: &EditorForm,
    controller: &Controller<S>,
    palette: &Palette,
) {
    let Some(buffer) = controller.editor().buffer() else {
        return;
    };
    let field_line = |field: EditorField, label: &'static str, value: String| {
        let focused = form.field == field;
        let marker = if focused { "> " } else { "  " };
        let style = if focused {
            Style::default()
                .fg(palette.accent)
                .add_modifier(Modifier::BOLD)
        } else {
            Style::default()
        };
        Line::from(vec![
            Span::styled(format!("{marker}{label:<10}"), style),
            Span::raw(value),
        ])
    };

    let tags = if buffer.categories().is_empty() {
        "-".to_string()
    } else {
        buffer
            .categories()
            .iter()
            .map(|c| format!("[{c}]"))
            .collect::<Vec<_>>()
            .join(" ")
    };
    let mut lines = vec![
        field_line(EditorField::Text, "Text", buffer.text.clone()),
        field_line(
            EditorField::Priority,
            "Priority",
            format!("< {} >", buffer.priority),
        ),
        field_line(EditorField::DueDate, "Due", form.due_input.clone()),
        field_line(
            EditorField::Completed,
            "Completed",
            if buffer.completed { "[x]" } else { "[ ]" }.to_string(),
        ),
        field_line(
            EditorField::Category,
            "Category",
            form.category_input.clone(),
        ),
        Line::from(format!("  {:<10}{tags}", "Tags")),
        Line::default(),
    ];
    if let Some(error) = &form.error {
        lines.push(Line::from(Span::styled(
            error.as_str(),
            Style::default().fg(palette.danger),
        )));
    }
    lines.push(Line::from(Span::styled(
        "Tab next field  Ctrl-S save  Esc cancel",
        Style::default().fg(palette.muted),
    )));

    let area = centered_rect(60, 14, frame.area());
    frame.render_widget(Clear, area);
    frame.render_widget(
        Paragraph::new(lines).style(palette.base).block(
            Block::default()
                .borders(Borders::ALL)
                .border_type(BorderType::Rounded)
                .title("Edit task"),
        ),
        area,
    );
}

fn centered_rect(percent_x: u16, height: u16, area: Rect) -> Rect {
    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Fill(1),
            Constraint::Length(height),
            Constraint::Fill(1),
        ])
        .split(area);
    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(vertical[1])[1]
}

/// Blocking yes/no dialog drawn over a cleared screen; the board redraws afterwards.
struct TerminalConfirm<'a> {
    terminal: &'a mut Terminal<Backend>,
    palette: Palette,
}

impl Confirm for TerminalConfirm<'_> {
    fn confirm(&mut self, message: &str) -> bool {
        let palette = self.palette;
        loop {
            let drawn = self.terminal.draw(|frame| {
                frame.render_widget(Block::default().style(palette.base), frame.area());
                let area = centered_rect(50, 5, frame.area());
                let dialog = Paragraph::new(vec![
                    Line::from(message),
                    Line::from(Span::styled(
                        "y confirm  n cancel",
                        Style::default().fg(palette.muted),
                    )),
                ])
                .block(
                    Block::default()
                        .borders(Borders::ALL)
                        .border_type(BorderType::Rounded)
                        .title(Span::styled("Confirm", Style::default().fg(palette.danger))),
                );
                frame.render_widget(dialog, area);
            });
            if let Err(err) = drawn {
                debug!(%err, "failed to draw confirmation dialog");
                return false;
            }

            match event::read() {
                Ok(Event::Key(key)) if key.kind == KeyEventKind::Press => match key.code {
                    KeyCode::Char('y') | KeyCode::Char('Y') | KeyCode::Enter => return true,
                    KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => return false,
                    _ => {}
                },
                Ok(_) => {}
                Err(err) => {
                    debug!(%err, "failed to read confirmation key");
                    return false;
                }
            }
        }
    }
}

struct TerminalGuard;

impl TerminalGuard {
    fn enter() -> Result<Self> {
        enable_raw_mode()?;
        // Enter alternate screen to avoid polluting the shell buffer.
        execute!(io::stdout(), EnterAlternateScreen)?;
        Ok(Self)
    }

    fn terminal(&self) -> Result<Terminal<Backend>> {
        let backend = CrosstermBackend::new(io::stdout());
        Ok(Terminal::new(backend)?)
    }
}

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        // Best-effort cleanup; errors are logged but not propagated from Drop.
        if let Err(err) = disable_raw_mode() {
            eprintln!("failed to disable raw mode: {err}");
        }
        if let Err(err) = execute!(io::stdout(), LeaveAlternateScreen, DisableMouseCapture) {
            eprintln!("failed to restore terminal: {err}");
        }
    }
}
