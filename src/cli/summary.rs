use std::{fmt::Display, path::{Path, PathBuf}};

use anyhow::Result;
use chrono::{DateTime, Duration, Local, Weekday};
use clap::{Parser, ValueEnum};
use tracing::debug;

use crate::{
    aggregation::{
        config::{
            AggregationConfig, CalendarWindow, StopWords, WeekWindow, WordConfig,
            DEFAULT_MIN_TOKEN_LEN, DEFAULT_NORMALIZATION, DEFAULT_WORD_CAP,
        },
        grouping::saturating_add,
        query_aggregated_info, AggregatedResult, PieSlice,
    },
    boards::BoardTable,
    storage::{record_source::SessionFilter, session_storage::SessionStorageImpl},
    utils::{percentage::duration_percentage, time::format_duration},
};

use super::{parse_date, validation_error, DateStyle, BOARDS_FILE, RECORDS_DIR};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum WeekStart {
    Monday,
    Sunday,
    /// Today and the 6 days before it.
    Rolling,
}

impl From<WeekStart> for WeekWindow {
    fn from(value: WeekStart) -> Self {
        match value {
            WeekStart::Monday => WeekWindow::StartingOn(Weekday::Mon),
            WeekStart::Sunday => WeekWindow::StartingOn(Weekday::Sun),
            WeekStart::Rolling => WeekWindow::Trailing,
        }
    }
}

impl Display for WeekStart {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            WeekStart::Monday => write!(f, "monday"),
            WeekStart::Sunday => write!(f, "sunday"),
            WeekStart::Rolling => write!(f, "rolling"),
        }
    }
}

#[derive(Debug, Parser)]
pub struct SummaryCommand {
    #[arg(
        long,
        short,
        conflicts_with = "project",
        help = "Only include sessions of the board with this id"
    )]
    board: Option<String>,
    #[arg(long, short, help = "Only include sessions of the board with this name")]
    project: Option<String>,
    #[arg(
        long,
        help = "Moment the summary is made for. Examples are \"yesterday\", \"15/03/2025\", \"12:00 16/03/2025\". Defaults to now"
    )]
    now: Option<String>,
    #[arg(long, default_value_t = DateStyle::Uk, help = "Style of dates used during parsing. For Uk it's day/month/year. For Us it's month/day/year")]
    date_style: DateStyle,
    #[arg(long, default_value_t = WeekStart::Monday, help = "First day of a week, or rolling for the last 7 days")]
    week_start: WeekStart,
    #[arg(long, help = "Amount of days in the activity calendar. Defaults to one year")]
    calendar_days: Option<u32>,
    #[arg(long = "words", default_value_t = DEFAULT_WORD_CAP, help = "Maximum amount of words shown")]
    word_cap: usize,
    #[arg(long, default_value_t = DEFAULT_MIN_TOKEN_LEN, help = "Shorter words are ignored")]
    min_token_len: usize,
    #[arg(
        long,
        help = "File with words to ignore, one per line. Replaces the built in english list"
    )]
    stop_words: Option<PathBuf>,
    #[arg(long, help = "Show word frequencies instead of weights scaled to 100")]
    raw_weights: bool,
    #[arg(long, help = "Print the summary as json")]
    json: bool,
}

/// Command to process `summary` command. Loads sessions from the application directory and
/// prints their statistics.
pub async fn process_summary_command(command: SummaryCommand, app_dir: &Path) -> Result<()> {
    let storage = SessionStorageImpl::new(app_dir.join(RECORDS_DIR))?;
    let boards = BoardTable::load(&app_dir.join(BOARDS_FILE)).await?;

    let filter = resolve_filter(command.board.clone(), command.project.as_deref(), &boards)?;
    let now = match command.now.as_deref() {
        Some(v) => parse_date(v, Local::now(), command.date_style, "now")?,
        None => Local::now(),
    };
    let config = build_config(&command).await?;
    debug!("Summarizing {filter:?} at {now} with {config:?}");

    let result = query_aggregated_info(&storage, &filter, &now, &boards, &config).await?;

    if command.json {
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        print_summary(&result, now);
    }
    Ok(())
}

fn resolve_filter(
    board: Option<String>,
    project: Option<&str>,
    boards: &BoardTable,
) -> Result<SessionFilter> {
    match (board, project) {
        (Some(id), _) => Ok(SessionFilter::Board(id)),
        (None, Some(name)) => boards
            .find_by_name(name)
            .map(|id| SessionFilter::Board(id.to_string()))
            .ok_or_else(|| validation_error(format!("There is no project named {name}"))),
        (None, None) => Ok(SessionFilter::All),
    }
}

async fn build_config(command: &SummaryCommand) -> Result<AggregationConfig> {
    let stop_words = match &command.stop_words {
        Some(path) => StopWords::from_list(&tokio::fs::read_to_string(path).await?),
        None => StopWords::english(),
    };

    Ok(AggregationConfig {
        week: command.week_start.into(),
        calendar: command
            .calendar_days
            .map_or(CalendarWindow::Year, CalendarWindow::Days),
        words: WordConfig {
            cap: command.word_cap,
            min_token_len: command.min_token_len,
            normalize_to: (!command.raw_weights).then_some(DEFAULT_NORMALIZATION),
            stop_words,
        },
    })
}

fn print_summary(result: &AggregatedResult, now: DateTime<Local>) {
    println!("Pomodoros today\t{}", result.count.day);
    println!("Pomodoros this week\t{}", result.count.week);
    println!("Pomodoros this month\t{}", result.count.month);
    println!();

    let active_days = result.calendar_count.values().filter(|v| **v > 0).count();
    let sessions = result.calendar_count.values().sum::<u32>();
    println!(
        "Active days until {}\t{active_days} of {}",
        now.format("%x"),
        result.calendar_count.len()
    );
    println!("Sessions in calendar\t{sessions}");
    if let Some((day, count)) = result
        .calendar_count
        .iter()
        .filter(|(_, count)| **count > 0)
        .max_by(|a, b| a.1.cmp(b.1).then_with(|| b.0.cmp(a.0)))
    {
        println!("Busiest day\t{}\t{count}", day.format("%x"));
    }

    print_series("Apps", &result.pie_chart.app_data);
    print_series("Projects", &result.pie_chart.project_data);

    if !result.word_weights.is_empty() {
        println!();
        println!("Words");
        for word in &result.word_weights {
            println!("{:.0}\t{}", word.value, word.text);
        }
    }
}

fn print_series(title: &str, series: &[PieSlice]) {
    if series.is_empty() {
        return;
    }
    let total = series
        .iter()
        .fold(Duration::zero(), |sum, next| saturating_add(sum, next.value));

    println!();
    println!("{title}");
    for entry in series {
        println!(
            "{}\t{}\t{}",
            duration_percentage(entry.value, total),
            format_duration(entry.value),
            entry.name
        );
    }
}
