use chrono::{Duration, NaiveDate};

const RECORD_NAME_FORMAT: &str = "%Y-%m-%d";

/// This is the standard way of converting a date to a string in pomodoro-stats.
pub fn date_to_record_name(date: NaiveDate) -> String {
    date.format(RECORD_NAME_FORMAT).to_string()
}

/// Inverse of [date_to_record_name]. Returns `None` for names that weren't produced by it.
pub fn record_name_to_date(name: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(name, RECORD_NAME_FORMAT).ok()
}

/// Formats a duration the way it's shown in summaries, e.g. `1h5m0s`.
pub fn format_duration(v: Duration) -> String {
    if v.num_hours() > 0 {
        format!(
            "{}h{}m{}s",
            v.num_hours(),
            v.num_minutes() % 60,
            v.num_seconds() % 60
        )
    } else if v.num_minutes() > 0 {
        format!("{}m{}s", v.num_minutes() % 60, v.num_seconds() % 60)
    } else {
        format!("{}s", v.num_seconds() % 60)
    }
}
