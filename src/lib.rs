pub mod cli;
pub mod db;
pub mod error;
pub mod host;
pub mod models;
pub mod narration;
pub mod schedule;
pub mod settings;
pub mod timer;
mod utils;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;

use cli::{Cli, Commands};
use db::Database;
use settings::ConfigStore;

pub use error::{SessionError, SessionResult};
pub use timer::{SessionController, SessionEvent, SessionSnapshot, SessionStatus};

fn resolve_data_dir(cli_dir: Option<PathBuf>) -> Result<PathBuf> {
    let dir = match cli_dir {
        Some(dir) => dir,
        None => dirs::data_dir()
            .context("could not determine the platform data directory; pass --data-dir")?
            .join("focusmom"),
    };
    std::fs::create_dir_all(&dir)
        .with_context(|| format!("Failed to create data directory {}", dir.display()))?;
    Ok(dir)
}

pub async fn run() -> Result<()> {
    // Initialize logging (reads RUST_LOG env var)
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .parse_default_env()
        .init();

    let cli = Cli::parse();
    let data_dir = resolve_data_dir(cli.data_dir)?;
    log::debug!("using data directory {}", data_dir.display());

    let store = ConfigStore::open(data_dir.join(host::SETTINGS_FILE))?;

    match cli.command {
        Commands::Configure(args) => host::configure(&store, args.into()),
        Commands::Plan => host::plan(&store),
        Commands::History { limit } => {
            let database = Database::new(data_dir.join(host::DATABASE_FILE))?;
            host::history(&store, &database, limit).await
        }
        Commands::Run { count_up, clips } => {
            let database = Database::new(data_dir.join(host::DATABASE_FILE))?;
            host::run_session(&store, database, count_up, clips.as_deref()).await
        }
    }
}
