pub mod add;
pub mod summary;

use std::{fmt::Display, path::PathBuf};

use add::{process_add_command, AddCommand};
use anyhow::Result;
use chrono::{DateTime, Local};
use chrono_english::parse_date_string;
use clap::{CommandFactory, Parser, Subcommand, ValueEnum};
use summary::{process_summary_command, SummaryCommand};
use tracing::level_filters::LevelFilter;

use crate::utils::{
    dir::{create_application_default_path, create_dir},
    logging::{enable_logging, CLI_PREFIX},
};

/// Directory inside the application directory holding session files.
pub const RECORDS_DIR: &str = "records";
/// Board table exported by the kanban view.
pub const BOARDS_FILE: &str = "boards.json";
pub const LOGS_DIR: &str = "logs";

#[derive(Parser, Debug)]
#[command(name = "pomodoro-stats", version, long_about = None)]
#[command(about = "Statistics of your pomodoro sessions", long_about = None)]
struct Args {
    #[command(subcommand)]
    commands: Commands,
    #[arg(long, global = true, help = "Enable logging")]
    log: bool,
    #[arg(
        long,
        global = true,
        help = "Application directory. By default tries to use $XDG_STATE_HOME or $HOME/.local/state"
    )]
    dir: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
#[command(version, about, long_about = None)]
enum Commands {
    #[command(about = "Display counts, activity calendar, time spent and frequent words")]
    Summary {
        #[command(flatten)]
        command: SummaryCommand,
    },
    #[command(about = "Record a finished session")]
    Add {
        #[command(flatten)]
        command: AddCommand,
    },
}

pub async fn run_cli() -> Result<()> {
    let args = Args::parse();

    let app_dir = args
        .dir
        .map_or_else(create_application_default_path, create_dir)?;

    let logging_level = if args.log {
        Some(LevelFilter::TRACE)
    } else {
        None
    };
    enable_logging(CLI_PREFIX, &app_dir.join(LOGS_DIR), logging_level, args.log)?;

    match args.commands {
        Commands::Summary { command } => process_summary_command(command, &app_dir).await,
        Commands::Add { command } => process_add_command(command, &app_dir).await,
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum DateStyle {
    Uk,
    Us,
}

impl From<DateStyle> for chrono_english::Dialect {
    fn from(value: DateStyle) -> Self {
        match value {
            DateStyle::Uk => Self::Uk,
            DateStyle::Us => Self::Us,
        }
    }
}

impl Display for DateStyle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DateStyle::Uk => write!(f, "uk"),
            DateStyle::Us => write!(f, "us"),
        }
    }
}

/// Parses human dates like "yesterday" or "12:00 16/03/2025" relative to `now`.
pub fn parse_date(
    value: &str,
    now: DateTime<Local>,
    date_style: DateStyle,
    argument: &str,
) -> Result<DateTime<Local>> {
    parse_date_string(value, now, date_style.into()).map_err(|e| {
        validation_error(format!("Failed to validate {argument} {e}"))
    })
}

/// Creates an error that's reported the same way as a clap argument error.
pub fn validation_error(message: String) -> anyhow::Error {
    Args::command()
        .error(clap::error::ErrorKind::ValueValidation, message)
        .into()
}
