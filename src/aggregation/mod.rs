//! Turns a batch of pomodoro sessions into the statistics shown in the history view.
//!
//! [get_aggregated_info] is a pure function of the sessions, the reference instant, the board
//! names and the [config::AggregationConfig]. Nothing is cached between calls, so concurrent
//! calls share no state. [query_aggregated_info] adds the single asynchronous step of loading
//! the sessions from a [RecordSource].

pub mod config;
pub mod grouping;
pub mod window;
pub mod words;

use std::{
    collections::{BTreeMap, HashMap},
    fmt::Display,
};

use chrono::{DateTime, Duration, NaiveDate, TimeZone};
use config::AggregationConfig;
use grouping::{aggregate, app_key, densify, into_series, project_key, session_duration};
use serde::{Serialize, Serializer};
use tracing::{debug, error, instrument};
use window::{calendar_key, count_windows, CalendarRange};

use crate::{
    boards::BoardNameResolver,
    storage::{
        entities::SessionRecord,
        record_source::{FindOptions, RecordSource, SessionFilter},
    },
};

/// Amount of sessions started today, this week and this month.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct WindowCounts {
    pub day: u32,
    pub week: u32,
    pub month: u32,
}

/// Time spent on one application or project.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PieSlice {
    pub name: String,
    #[serde(serialize_with = "serialize_seconds")]
    pub value: Duration,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PieChart {
    pub app_data: Vec<PieSlice>,
    pub project_data: Vec<PieSlice>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WordWeight {
    pub text: String,
    pub value: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AggregatedResult {
    pub count: WindowCounts,
    /// Sessions per day. Has an entry for every day of the calendar window.
    pub calendar_count: BTreeMap<NaiveDate, u32>,
    pub pie_chart: PieChart,
    pub word_weights: Vec<WordWeight>,
}

fn serialize_seconds<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_i64(duration.num_seconds())
}

/// The only way aggregation can fail. There are no partial results.
#[derive(Debug)]
pub enum AggregationError {
    /// Sessions couldn't be loaded.
    Source(anyhow::Error),
    InvalidConfig(String),
    /// The calendar window ending on this day can't be represented.
    OutOfRange(NaiveDate),
}

impl Display for AggregationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AggregationError::Source(e) => write!(f, "failed to load sessions: {e}"),
            AggregationError::InvalidConfig(reason) => {
                write!(f, "invalid aggregation config: {reason}")
            }
            AggregationError::OutOfRange(day) => {
                write!(f, "calendar window ending on {day} is out of range")
            }
        }
    }
}

impl std::error::Error for AggregationError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            AggregationError::Source(e) => Some(&**e),
            AggregationError::InvalidConfig(_) | AggregationError::OutOfRange(_) => None,
        }
    }
}

/// Computes every statistic of the history view for `records` as seen at `now`. Days, weeks and
/// months follow the calendar of `now`'s time zone.
#[instrument(skip_all, fields(records = records.len()))]
pub fn get_aggregated_info<Tz: TimeZone>(
    records: &[SessionRecord],
    now: &DateTime<Tz>,
    boards: &(impl BoardNameResolver + ?Sized),
    config: &AggregationConfig,
) -> Result<AggregatedResult, AggregationError> {
    config.validate()?;
    let today = now.date_naive();
    let range = CalendarRange::ending_at(today, config.calendar)
        .ok_or(AggregationError::OutOfRange(today))?;
    let timezone = now.timezone();

    let count = count_windows(records, now, config.week);

    let days: HashMap<NaiveDate, u32> =
        aggregate(records, |v| calendar_key(&timezone, &v.started_at), |_| 1);
    let calendar_count = densify(&days, &range);

    let pie_chart = PieChart {
        app_data: into_series(aggregate(records, app_key, session_duration)),
        project_data: into_series(aggregate(
            records,
            |v| project_key(v, boards),
            session_duration,
        )),
    };

    let word_weights = words::weigh(records, &config.words);

    debug!(
        "Aggregated {:?} sessions, {} apps, {} projects, {} words",
        count,
        pie_chart.app_data.len(),
        pie_chart.project_data.len(),
        word_weights.len()
    );

    Ok(AggregatedResult {
        count,
        calendar_count,
        pie_chart,
        word_weights,
    })
}

/// Loads sessions matching `filter` and aggregates them. A failing source fails the whole
/// query.
#[instrument(skip(source, now, boards, config))]
pub async fn query_aggregated_info<Tz: TimeZone>(
    source: &(impl RecordSource + ?Sized),
    filter: &SessionFilter,
    now: &DateTime<Tz>,
    boards: &(impl BoardNameResolver + ?Sized),
    config: &AggregationConfig,
) -> Result<AggregatedResult, AggregationError> {
    let records = source
        .find(filter, &FindOptions::default())
        .await
        .map_err(|e| {
            error!("Failed to load sessions {e:?}");
            AggregationError::Source(e)
        })?;
    get_aggregated_info(&records, now, boards, config)
}
