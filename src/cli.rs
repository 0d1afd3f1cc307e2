use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::models::{SessionConfig, MAX_DURATION_MINUTES, MAX_STRICTNESS, MIN_DURATION_MINUTES};

/// A focus timer that nags you like a strict parent
#[derive(Debug, Parser)]
#[command(
    name = "focusmom",
    version = env!("CARGO_PKG_VERSION"),
    about = "A focus session timer with a strict-parent narrator",
    long_about = None
)]
pub struct Cli {
    /// Directory for settings.json and the history database
    #[arg(global = true, long = "data-dir")]
    pub data_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Save the configuration the next session opens with
    Configure(ConfigureArgs),

    /// Open a session with the saved configuration
    Run {
        /// Show elapsed time instead of remaining time
        #[arg(long = "count-up")]
        count_up: bool,

        /// Directory of recorded narration clips (needs the `audio` feature)
        #[arg(long = "clips")]
        clips: Option<PathBuf>,
    },

    /// List finished sessions, newest first
    History {
        #[arg(long, default_value_t = 20)]
        limit: usize,
    },

    /// Print the break schedule and reminder times of the saved configuration
    Plan,
}

#[derive(Debug, Args)]
pub struct ConfigureArgs {
    #[arg(long)]
    pub title: String,

    #[arg(long, default_value = "")]
    pub goal: String,

    /// Planned length in minutes
    #[arg(
        long,
        default_value_t = 60,
        value_parser = clap::value_parser!(u32).range(i64::from(MIN_DURATION_MINUTES)..=i64::from(MAX_DURATION_MINUTES))
    )]
    pub duration: u32,

    #[arg(long = "no-breaks")]
    pub no_breaks: bool,

    #[arg(long, default_value = "")]
    pub workplace: String,

    /// 0 (chill) to 100 (insane)
    #[arg(
        long,
        default_value_t = 50,
        value_parser = clap::value_parser!(u8).range(0..=i64::from(MAX_STRICTNESS))
    )]
    pub strictness: u8,
}

impl From<ConfigureArgs> for SessionConfig {
    fn from(args: ConfigureArgs) -> Self {
        SessionConfig {
            title: args.title,
            goal: args.goal,
            duration_minutes: args.duration,
            breaks_enabled: !args.no_breaks,
            workplace: args.workplace,
            strictness: args.strictness,
        }
    }
}
