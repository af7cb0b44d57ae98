use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use taskdeck_core::{
    filter::{Criteria, StatusFilter},
    tasks::{Priority, TaskId},
};

/// CLI surface definition. Every task command goes through the same controller as the TUI.
#[derive(Parser, Debug)]
#[command(
    name = "taskdeck",
    about = "Local-first task list manager",
    version,
    propagate_version = true
)]
pub struct Cli {
    /// Optional subcommand; defaults to launching the TUI when absent.
    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Launch the interactive board (press q to exit).
    Tui,
    /// Print version and exit.
    Version,
    /// Check that the data directory can be written and read back.
    Health,
    /// Manage CLI configuration.
    #[command(subcommand)]
    Config(ConfigCommand),
    /// Add a task at the top of the list.
    Add {
        #[arg(required = true, num_args = 1..)]
        text: Vec<String>,
    },
    /// List tasks matching the given filters.
    #[command(alias = "ls")]
    List(ListArgs),
    /// Flip a task between pending and completed.
    Toggle { id: TaskId },
    /// Edit a task's fields.
    Edit(EditArgs),
    /// Delete a task after confirmation.
    #[command(alias = "delete")]
    Rm {
        id: TaskId,
        /// Skip the confirmation prompt.
        #[arg(short, long)]
        yes: bool,
    },
    /// Move a task to the position currently held by another task.
    Move { source: TaskId, target: TaskId },
    /// Print the known categories.
    Categories,
    /// Print the colour theme, optionally switching it first.
    Theme {
        #[arg(long)]
        toggle: bool,
    },
    /// Print total, completed and pending counts.
    Stats,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum ConfigCommand {
    /// Create a default config file if one does not exist.
    Init,
}

#[derive(Args, Debug, Clone, PartialEq, Eq, Default)]
pub struct ListArgs {
    /// all, completed or pending.
    #[arg(long, default_value = "all")]
    pub status: StatusFilter,
    #[arg(long)]
    pub priority: Option<Priority>,
    #[arg(long)]
    pub category: Option<String>,
    /// Case-insensitive substring of the task text.
    #[arg(long, default_value = "")]
    pub search: String,
}

impl ListArgs {
    pub fn criteria(&self) -> Criteria {
        Criteria {
            status: self.status,
            priority: self.priority,
            category: self.category.clone(),
            search: self.search.clone(),
        }
    }
}

#[derive(Args, Debug, Clone, PartialEq, Eq, Default)]
pub struct EditArgs {
    pub id: TaskId,
    #[arg(long)]
    pub text: Option<String>,
    #[arg(long)]
    pub priority: Option<Priority>,
    /// Due date as YYYY-MM-DD.
    #[arg(long, conflicts_with = "clear_due")]
    pub due: Option<NaiveDate>,
    #[arg(long)]
    pub clear_due: bool,
    #[arg(long = "add-category")]
    pub add_categories: Vec<String>,
    #[arg(long = "remove-category")]
    pub remove_categories: Vec<String>,
    #[arg(long)]
    pub completed: Option<bool>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_to_tui_when_missing_subcommand() {
        let cli = Cli::try_parse_from(["taskdeck"]).expect("parse should succeed");
        assert_eq!(cli.command, None);
    }

    #[test]
    fn parses_config_init_subcommand() {
        let cli =
            Cli::try_parse_from(["taskdeck", "config", "init"]).expect("parse should succeed");
        assert_eq!(cli.command, Some(Command::Config(ConfigCommand::Init)));
    }

    #[test]
    fn add_keeps_every_word() {
        let cli = Cli::try_parse_from(["taskdeck", "add", "Buy", "milk"]).expect("parse");
        assert_eq!(
            cli.command,
            Some(Command::Add {
                text: vec!["Buy".into(), "milk".into()]
            })
        );
        assert!(Cli::try_parse_from(["taskdeck", "add"]).is_err());
    }

    #[test]
    fn parses_list_filters() {
        let cli = Cli::try_parse_from([
            "taskdeck",
            "list",
            "--status",
            "completed",
            "--priority",
            "high",
            "--category",
            "Work",
            "--search",
            "rent",
        ])
        .expect("parse");
        let Some(Command::List(args)) = cli.command else {
            panic!("expected list command");
        };
        assert_eq!(
            args.criteria(),
            Criteria {
                status: StatusFilter::Completed,
                priority: Some(Priority::High),
                category: Some("Work".into()),
                search: "rent".into(),
            }
        );
    }

    #[test]
    fn rejects_unknown_priority() {
        assert!(Cli::try_parse_from(["taskdeck", "list", "--priority", "urgent"]).is_err());
    }

    #[test]
    fn parses_edit_fields() {
        let cli = Cli::try_parse_from([
            "taskdeck",
            "edit",
            "17",
            "--due",
            "2025-01-05",
            "--add-category",
            "Home",
            "--add-category",
            "Bills",
            "--completed",
            "true",
        ])
        .expect("parse");
        assert_eq!(
            cli.command,
            Some(Command::Edit(EditArgs {
                id: 17,
                due: NaiveDate::from_ymd_opt(2025, 1, 5),
                add_categories: vec!["Home".into(), "Bills".into()],
                completed: Some(true),
                ..EditArgs::default()
            }))
        );
    }

    #[test]
    fn due_and_clear_due_conflict() {
        let parsed = Cli::try_parse_from([
            "taskdeck",
            "edit",
            "1",
            "--due",
            "2025-01-05",
            "--clear-due",
        ]);
        assert!(parsed.is_err());
    }

    #[test]
    fn parses_rm_with_yes() {
        let cli = Cli::try_parse_from(["taskdeck", "rm", "5", "-y"]).expect("parse");
        assert_eq!(cli.command, Some(Command::Rm { id: 5, yes: true }));
    }
}
