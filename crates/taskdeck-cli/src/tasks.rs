use std::io::{self, BufRead, Write};

use chrono::{Local, NaiveDate};
use color_eyre::{eyre::eyre, Result};
use taskdeck_core::{
    storage::KeyValueStore,
    tasks::TaskStats,
    view::{TaskListView, TaskView},
};
use taskdeck_task::{Confirm, Controller};

use crate::{cli::Command, config, storage};

/// Execute a task subcommand against the configured store.
pub fn handle(cmd: Command, config: &config::Config) -> Result<()> {
    let store = storage::store_from_config(config)?;
    let mut controller = Controller::load(store).map_err(report)?;

    let mut prompt = StdinConfirm;
    let mut assume_yes = |_: &str| true;
    let confirm: &mut dyn Confirm = if matches!(cmd, Command::Rm { yes: true, .. }) {
        &mut assume_yes
    } else {
        &mut prompt
    };

    let mut out = io::stdout().lock();
    run(
        cmd,
        &mut controller,
        &mut out,
        confirm,
        Local::now().date_naive(),
    )
}

/// Dispatch one command and write its human-readable result to `out`.
pub fn run<S: KeyValueStore>(
    cmd: Command,
    controller: &mut Controller<S>,
    out: &mut impl Write,
    confirm: &mut dyn Confirm,
    today: NaiveDate,
) -> Result<()> {
    match cmd {
        Command::Add { text } => match controller.add_task(&text.join(" ")).map_err(report)? {
            Some(id) => {
                let text = controller.tasks().get(id).map(|t| t.text.as_str());
                writeln!(out, "Added task {id}: {}", text.unwrap_or_default())?;
            }
            None => writeln!(out, "Task text cannot be empty; nothing added.")?,
        },
        Command::List(args) => {
            controller.set_criteria(args.criteria());
            let board = controller.view(today);
            match &board.list {
                TaskListView::Empty(empty) => {
                    writeln!(out, "{}", empty.title)?;
                    writeln!(out, "  {}", empty.hint)?;
                }
                TaskListView::Items(items) => {
                    for item in items {
                        writeln!(out, "{}", item_line(item))?;
                    }
                }
            }
            writeln!(out, "{}", stats_line(board.stats))?;
        }
        Command::Toggle { id } => {
            if controller.toggle_complete(id).map_err(report)? {
                let done = controller.tasks().get(id).is_some_and(|t| t.completed);
                let state = if done { "completed" } else { "pending" };
                writeln!(out, "Task {id} is now {state}.")?;
            } else {
                writeln!(out, "No task with id {id}.")?;
            }
        }
        Command::Edit(args) => {
            let id = args.id;
            if !controller.open_editor(id) {
                writeln!(out, "No task with id {id}.")?;
                return Ok(());
            }
            if let Some(buffer) = controller.edit_buffer_mut() {
                if let Some(text) = args.text {
                    buffer.text = text;
                }
                if let Some(priority) = args.priority {
                    buffer.priority = priority;
                }
                if args.due.is_some() || args.clear_due {
                    buffer.due_date = args.due;
                }
                if let Some(completed) = args.completed {
                    buffer.completed = completed;
                }
            }
            for name in &args.add_categories {
                controller.add_editor_category(name).map_err(report)?;
            }
            for name in &args.remove_categories {
                controller.remove_editor_category(name);
            }
            if controller.save_editor().map_err(report)? {
                writeln!(out, "Updated task {id}.")?;
            } else {
                controller.cancel_editor();
                writeln!(out, "Task text cannot be empty; nothing saved.")?;
            }
        }
        Command::Rm { id, .. } => {
            let known = controller.tasks().get(id).is_some();
            if controller.delete_task(id, confirm).map_err(report)? {
                writeln!(out, "Deleted task {id}.")?;
            } else if known {
                writeln!(out, "Kept task {id}.")?;
            } else {
                writeln!(out, "No task with id {id}.")?;
            }
        }
        Command::Move { source, target } => {
            if controller.move_task(source, target).map_err(report)? {
                writeln!(out, "Moved task {source} to the position of task {target}.")?;
            } else {
                writeln!(out, "Nothing to move.")?;
            }
        }
        Command::Categories => {
            for name in controller.categories().iter() {
                writeln!(out, "{name}")?;
            }
        }
        Command::Theme { toggle } => {
            let theme = if toggle {
                controller.toggle_theme().map_err(report)?
            } else {
                controller.theme()
            };
            writeln!(out, "Theme: {theme}")?;
        }
        Command::Stats => writeln!(out, "{}", stats_line(controller.stats()))?,
        other => return Err(eyre!("{other:?} is not a task command")),
    }
    Ok(())
}

fn item_line(item: &TaskView) -> String {
    let check = if item.completed { "[x]" } else { "[ ]" };
    let mut line = format!(
        "{}  {check} {}  ({})",
        item.id,
        item.text,
        item.priority_badge()
    );
    if let Some(due) = &item.due {
        line.push_str(&format!("  due {}", due.label));
        if due.overdue {
            line.push_str(" (overdue)");
        }
    }
    if let Some(category) = &item.category {
        line.push_str(&format!("  #{category}"));
    }
    line
}

fn stats_line(stats: TaskStats) -> String {
    format!(
        "total: {}  completed: {}  pending: {}",
        stats.total, stats.completed, stats.pending
    )
}

pub(crate) fn report(err: anyhow::Error) -> color_eyre::Report {
    eyre!("{err:#}")
}

/// Blocking y/N prompt on stdin; anything but `y`/`yes` declines.
struct StdinConfirm;

impl Confirm for StdinConfirm {
    fn confirm(&mut self, message: &str) -> bool {
        eprint!("{message} [y/N] ");
        if io::stderr().flush().is_err() {
            return false;
        }
        let mut answer = String::new();
        match io::stdin().lock().read_line(&mut answer) {
            Ok(_) => matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes"),
            Err(_) => false,
        }
    }
}
