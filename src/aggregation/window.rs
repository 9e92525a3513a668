use chrono::{DateTime, Datelike, Days, Months, NaiveDate, TimeZone, Utc, Weekday};

use crate::storage::entities::SessionRecord;

use super::{
    config::{CalendarWindow, WeekWindow},
    WindowCounts,
};

/// Membership of a timestamp in the summary windows of a reference instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowMembership {
    pub in_day: bool,
    pub in_week: bool,
    pub in_month: bool,
    /// Day of the timestamp on the calendar of the reference instant.
    pub calendar_key: NaiveDate,
}

/// Classifies `ts` against the day, week and month of `now`. Days are taken from the time zone
/// of `now`, so a session starting exactly at local midnight belongs to the day that starts
/// there. Timestamps after `now` are classified like any other.
pub fn classify<Tz: TimeZone>(
    now: &DateTime<Tz>,
    ts: &DateTime<Utc>,
    week: WeekWindow,
) -> WindowMembership {
    let today = now.date_naive();
    let day = calendar_key(&now.timezone(), ts);

    let in_week = match week {
        WeekWindow::StartingOn(start) => {
            let offset = day
                .signed_duration_since(week_start_date(today, start))
                .num_days();
            (0..7).contains(&offset)
        }
        WeekWindow::Trailing => (0..7).contains(&today.signed_duration_since(day).num_days()),
    };

    WindowMembership {
        in_day: day == today,
        in_week,
        in_month: day.year() == today.year() && day.month() == today.month(),
        calendar_key: day,
    }
}

/// Local date of `ts` in `tz`.
pub fn calendar_key<Tz: TimeZone>(tz: &Tz, ts: &DateTime<Utc>) -> NaiveDate {
    ts.with_timezone(tz).date_naive()
}

/// Returns the latest `start` weekday on or before `date`.
pub fn week_start_date(date: NaiveDate, start: Weekday) -> NaiveDate {
    let back = (7 + date.weekday().num_days_from_monday() - start.num_days_from_monday()) % 7;
    date.checked_sub_days(Days::new(back.into())).unwrap_or(NaiveDate::MIN)
}

/// Counts sessions by the window their start falls into.
pub fn count_windows<'a, Tz: TimeZone>(
    records: impl IntoIterator<Item = &'a SessionRecord>,
    now: &DateTime<Tz>,
    week: WeekWindow,
) -> WindowCounts {
    records
        .into_iter()
        .map(|v| classify(now, &v.started_at, week))
        .fold(WindowCounts::default(), |mut counts, membership| {
            counts.day += membership.in_day as u32;
            counts.week += membership.in_week as u32;
            counts.month += membership.in_month as u32;
            counts
        })
}

/// Inclusive range of days shown in the activity calendar.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CalendarRange {
    first: NaiveDate,
    last: NaiveDate,
}

impl CalendarRange {
    /// Creates the range that ends on `today`. Returns `None` for an empty window or when the
    /// start can't be represented.
    pub fn ending_at(today: NaiveDate, window: CalendarWindow) -> Option<Self> {
        let first = match window {
            CalendarWindow::Year => today.checked_sub_months(Months::new(12))?.succ_opt()?,
            CalendarWindow::Days(0) => return None,
            CalendarWindow::Days(days) => today.checked_sub_days(Days::new((days - 1).into()))?,
        };
        Some(Self { first, last: today })
    }

    pub fn first(&self) -> NaiveDate {
        self.first
    }

    pub fn last(&self) -> NaiveDate {
        self.last
    }

    pub fn contains(&self, day: NaiveDate) -> bool {
        self.first <= day && day <= self.last
    }

    pub fn len_days(&self) -> usize {
        (self.last.signed_duration_since(self.first).num_days() + 1) as usize
    }

    /// Iterates over every day of the range in ascending order.
    pub fn days(&self) -> impl Iterator<Item = NaiveDate> {
        let last = self.last;
        self.first.iter_days().take_while(move |v| *v <= last)
    }
}
