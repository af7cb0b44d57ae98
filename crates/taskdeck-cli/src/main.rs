mod cli;
mod config;
mod storage;
mod tasks;
mod tui;

use crate::cli::ConfigCommand;
use clap::Parser;
use color_eyre::{eyre::eyre, Result};
use taskdeck_core::storage::KeyValueStore;
use taskdeck_task::Controller;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Entry point wiring the CLI subcommands and the interactive board.
fn main() -> Result<()> {
    color_eyre::install()?;

    let cli = cli::Cli::parse();
    let config = config::load()?;
    init_tracing(config.log_level.as_deref());

    match cli.command.unwrap_or(cli::Command::Tui) {
        cli::Command::Tui => {
            let store = storage::store_from_config(&config)?;
            let controller = Controller::load(store).map_err(tasks::report)?;
            tui::launch(controller)?
        }
        cli::Command::Version => print_version(),
        cli::Command::Health => run_health_check(&config)?,
        cli::Command::Config(ConfigCommand::Init) => init_config(&config)?,
        cmd => tasks::handle(cmd, &config)?,
    }

    Ok(())
}

fn init_tracing(configured: Option<&str>) {
    // RUST_LOG wins over the config file; stderr keeps stdout clean for command output.
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(configured.unwrap_or("warn")))
        .unwrap_or_else(|_| EnvFilter::new("warn"));
    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_target(false)
        .with_writer(std::io::stderr);
    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .init();
}

fn print_version() {
    println!("taskdeck {}", env!("CARGO_PKG_VERSION"));
}

/// Runs a quick write/read/delete probe against the data directory.
fn run_health_check(config: &config::Config) -> Result<()> {
    let store = storage::store_from_config(config)?;
    run_store_health(&store)?;
    println!("Storage: ok");
    Ok(())
}

fn run_store_health<S: KeyValueStore>(store: &S) -> Result<()> {
    let probe_key = "health/probe";
    let payload = "ok";
    store
        .put(probe_key, payload)
        .map_err(|e| eyre!(e.to_string()))?;
    let round_trip = store.get(probe_key).map_err(|e| eyre!(e.to_string()))?;
    store.delete(probe_key).map_err(|e| eyre!(e.to_string()))?;

    if round_trip != payload {
        color_eyre::eyre::bail!("storage round-trip failed");
    }
    Ok(())
}

fn init_config(config: &config::Config) -> Result<()> {
    let path = config::write_default_if_missing(config)?;
    println!("Config initialized at {}", path.display());
    Ok(())
}
