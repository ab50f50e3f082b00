use std::env;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use once_cell::sync::OnceCell;
use tracing_subscriber::{fmt, EnvFilter};

use crate::config::ConfigLoader;
use crate::journal::JournalStore;
use crate::storage;

pub mod commands;

use self::commands::{AddArgs, ConfirmArgs, DeleteArgs, ExportArgs, ImportArgs, RenderArgs};

#[derive(Parser, Debug)]
#[command(name = "journal", version, about = "Personal journal kept in local storage")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Override the config file location (takes precedence over JOURNAL_CONFIG)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Override the data directory (takes precedence over JOURNAL_DATA)
    #[arg(long)]
    pub data_dir: Option<PathBuf>,

    /// Minimum log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    pub log_level: String,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List entries, newest first (default)
    List,
    /// Save a new entry
    Add(AddArgs),
    /// Delete one entry by id
    Delete(DeleteArgs),
    /// Delete every entry
    Clear(ConfirmArgs),
    /// Write the journal to my-journal-<date>.json
    Export(ExportArgs),
    /// Replace the journal with the entries in a JSON file
    Import(ImportArgs),
    /// Write the journal as an HTML page
    Render(RenderArgs),
}

pub fn run() -> Result<()> {
    let cli = Cli::parse();

    if let Some(path) = &cli.config {
        env::set_var("JOURNAL_CONFIG", path);
    }
    if let Some(path) = &cli.data_dir {
        env::set_var("JOURNAL_DATA", path);
    }

    let loader = ConfigLoader::discover()?;
    loader.paths().ensure_directories()?;
    let paths = loader.paths().clone();
    init_tracing(&cli.log_level)
        .with_context(|| format!("initialising logging at level {}", cli.log_level))?;
    let config = loader.load_or_init()?;
    let storage = storage::init(&paths, &config.storage).context("opening entry storage")?;

    let mut store = JournalStore::new(storage, config.bootstrap.dataset())
        .with_formatter(config.display.formatter())
        .with_notification_duration(config.notifications.duration());

    let command = cli.command.unwrap_or(Commands::List);
    match command {
        Commands::List => commands::list_entries(&mut store),
        Commands::Add(args) => commands::add_entry(&mut store, args),
        Commands::Delete(args) => commands::delete_entry(&mut store, args),
        Commands::Clear(args) => commands::clear_entries(&mut store, args),
        Commands::Export(args) => commands::export_journal(&mut store, &config.export, args),
        Commands::Import(args) => commands::import_journal(&mut store, args),
        Commands::Render(args) => commands::render_journal(&mut store, args),
    }
}

fn init_tracing(level: &str) -> Result<()> {
    static INIT: OnceCell<()> = OnceCell::new();
    INIT.get_or_try_init(|| {
        let env_filter = EnvFilter::try_new(level).unwrap_or_else(|_| EnvFilter::new("info"));
        fmt()
            .with_env_filter(env_filter)
            .with_writer(std::io::stderr)
            .init();
        Ok(())
    })
    .map(|_| ())
}
