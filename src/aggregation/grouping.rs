use std::{
    collections::{hash_map::Entry, BTreeMap, HashMap},
    hash::Hash,
    path::Path,
};

use chrono::{Duration, NaiveDate};
use tracing::debug;

use crate::{boards::BoardNameResolver, storage::entities::SessionRecord};

use super::{window::CalendarRange, PieSlice};

/// Group for sessions without a tracked application.
pub const UNKNOWN_APP: &str = "unknown";
/// Group for sessions without a board, or with a board that no longer exists.
pub const UNASSIGNED_PROJECT: &str = "unassigned";

/// A value that can be summed per group. Sums saturate instead of overflowing, so corrupted
/// records can't crash the aggregation.
pub trait Accumulate {
    fn accumulate(&mut self, other: Self);
}

impl Accumulate for u32 {
    fn accumulate(&mut self, other: Self) {
        *self = self.saturating_add(other);
    }
}

impl Accumulate for Duration {
    fn accumulate(&mut self, other: Self) {
        *self = saturating_add(*self, other);
    }
}

/// Adds durations, saturating at [Duration::MAX] and [Duration::MIN].
pub fn saturating_add(a: Duration, b: Duration) -> Duration {
    a.checked_add(&b).unwrap_or(if b < Duration::zero() {
        Duration::MIN
    } else {
        Duration::MAX
    })
}

/// Folds records into groups. Accumulation is commutative, so the order of `records` doesn't
/// affect the result.
pub fn aggregate<'a, K, V>(
    records: impl IntoIterator<Item = &'a SessionRecord>,
    mut key_fn: impl FnMut(&SessionRecord) -> K,
    mut value_fn: impl FnMut(&SessionRecord) -> V,
) -> HashMap<K, V>
where
    K: Eq + Hash,
    V: Accumulate,
{
    let mut groups: HashMap<K, V> = HashMap::new();
    for record in records {
        let value = value_fn(record);
        match groups.entry(key_fn(record)) {
            Entry::Occupied(mut entry) => entry.get_mut().accumulate(value),
            Entry::Vacant(entry) => {
                entry.insert(value);
            }
        }
    }
    groups
}

/// Time spent in a session. Corrupted sessions that end before they start count as zero.
pub fn session_duration(record: &SessionRecord) -> Duration {
    record.span().max(Duration::zero())
}

pub fn app_key(record: &SessionRecord) -> String {
    match record.app_name.as_deref().map(str::trim) {
        Some(name) if !name.is_empty() => clean_app_name(name),
        _ => UNKNOWN_APP.to_string(),
    }
}

pub fn project_key(record: &SessionRecord, boards: &(impl BoardNameResolver + ?Sized)) -> String {
    let Some(id) = record.board_id.as_deref() else {
        return UNASSIGNED_PROJECT.to_string();
    };
    match boards.board_name(id) {
        Some(name) => name.to_string(),
        None => {
            debug!("Board {id} of session {} is unknown", record.id);
            UNASSIGNED_PROJECT.to_string()
        }
    }
}

/// Application names may be full paths to an executable. Only the executable name is kept so
/// the same program is grouped together.
fn clean_app_name(value: &str) -> String {
    Path::new(value)
        .file_name()
        .map(|v| v.to_string_lossy().to_string())
        .unwrap_or_else(|| value.to_string())
}

/// Produces exactly one entry per day of `range`. Days without sessions are 0, days outside of
/// the range are dropped.
pub fn densify(
    grouped: &HashMap<NaiveDate, u32>,
    range: &CalendarRange,
) -> BTreeMap<NaiveDate, u32> {
    range
        .days()
        .map(|day| (day, grouped.get(&day).copied().unwrap_or(0)))
        .collect()
}

/// Orders groups by time spent, largest first. Equal durations are ordered by name.
pub fn into_series(grouped: HashMap<String, Duration>) -> Vec<PieSlice> {
    let mut series = grouped
        .into_iter()
        .map(|(name, value)| PieSlice { name, value })
        .collect::<Vec<_>>();
    series.sort_by(|a, b| b.value.cmp(&a.value).then_with(|| a.name.cmp(&b.name)));
    series
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use chrono::{DateTime, Duration, NaiveDate, TimeZone, Utc};

    use crate::{
        aggregation::{config::CalendarWindow, window::CalendarRange, PieSlice},
        boards::BoardTable,
        storage::entities::SessionRecord,
    };

    use super::{
        aggregate, app_key, densify, into_series, project_key, saturating_add, session_duration,
        UNASSIGNED_PROJECT, UNKNOWN_APP,
    };

    fn start() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 4, 10, 9, 0, 0).unwrap()
    }

    fn session(id: &str, minutes: i64) -> SessionRecord {
        SessionRecord::new(id, start(), start()).with_duration(Duration::minutes(minutes))
    }

    #[test]
    fn durations_are_summed_per_group() {
        let records = vec![
            session("a", 25).with_app("Editor"),
            session("b", 25).with_app("Editor"),
            session("c", 10).with_app("Browser"),
            session("d", 5),
        ];

        let grouped = aggregate(&records, app_key, session_duration);
        assert_eq!(grouped.len(), 3);
        assert_eq!(grouped["Editor"], Duration::minutes(50));
        assert_eq!(grouped["Browser"], Duration::minutes(10));
        assert_eq!(grouped[UNKNOWN_APP], Duration::minutes(5));

        let counted = aggregate(&records, app_key, |_| 1u32);
        assert_eq!(counted["Editor"], 2);
    }

    #[test]
    fn negative_durations_are_clamped() {
        let broken = session("a", -30).with_app("Editor");
        assert_eq!(session_duration(&broken), Duration::zero());

        let records = vec![broken, session("b", 10).with_app("Editor")];
        let grouped = aggregate(&records, app_key, session_duration);
        assert_eq!(grouped["Editor"], Duration::minutes(10));
    }

    #[test]
    fn extreme_durations_saturate() {
        let records = (0..600)
            .map(|i| {
                SessionRecord::new(
                    i.to_string(),
                    DateTime::<Utc>::MIN_UTC,
                    DateTime::<Utc>::MAX_UTC,
                )
                .with_app("Editor")
            })
            .collect::<Vec<_>>();

        let grouped = aggregate(&records, app_key, session_duration);
        assert_eq!(grouped["Editor"], Duration::MAX);

        let counted = aggregate(&records, app_key, |_| u32::MAX);
        assert_eq!(counted["Editor"], u32::MAX);

        assert_eq!(saturating_add(Duration::MIN, -Duration::seconds(1)), Duration::MIN);
        assert_eq!(
            saturating_add(Duration::minutes(5), Duration::minutes(20)),
            Duration::minutes(25)
        );
    }

    #[test]
    fn app_names_are_cleaned() {
        assert_eq!(app_key(&session("a", 1).with_app("/usr/bin/nvim")), "nvim");
        assert_eq!(app_key(&session("a", 1).with_app("Google Chrome")), "Google Chrome");
        assert_eq!(app_key(&session("a", 1).with_app("   ")), UNKNOWN_APP);
    }

    #[test]
    fn projects_fall_back_to_unassigned() {
        let boards: BoardTable = [("b1".to_string(), "Thesis".to_string())]
            .into_iter()
            .collect();

        assert_eq!(project_key(&session("a", 1).with_board("b1"), &boards), "Thesis");
        assert_eq!(
            project_key(&session("a", 1).with_board("deleted"), &boards),
            UNASSIGNED_PROJECT
        );
        assert_eq!(project_key(&session("a", 1), &boards), UNASSIGNED_PROJECT);
    }

    #[test]
    fn densify_fills_gaps_and_drops_outside_days() {
        let today = NaiveDate::from_ymd_opt(2024, 4, 10).unwrap();
        let range = CalendarRange::ending_at(today, CalendarWindow::Days(5)).unwrap();
        let grouped = HashMap::from([
            (today, 2),
            (NaiveDate::from_ymd_opt(2024, 4, 7).unwrap(), 1),
            (NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(), 7),
        ]);

        let calendar = densify(&grouped, &range);
        assert_eq!(
            calendar.into_iter().collect::<Vec<_>>(),
            vec![
                (NaiveDate::from_ymd_opt(2024, 4, 6).unwrap(), 0),
                (NaiveDate::from_ymd_opt(2024, 4, 7).unwrap(), 1),
                (NaiveDate::from_ymd_opt(2024, 4, 8).unwrap(), 0),
                (NaiveDate::from_ymd_opt(2024, 4, 9).unwrap(), 0),
                (today, 2),
            ]
        );
    }

    #[test]
    fn series_are_ordered_by_duration_then_name() {
        let series = into_series(HashMap::from([
            ("b".to_string(), Duration::minutes(10)),
            ("c".to_string(), Duration::minutes(50)),
            ("a".to_string(), Duration::minutes(10)),
        ]));
        assert_eq!(
            series,
            vec![
                PieSlice {
                    name: "c".into(),
                    value: Duration::minutes(50)
                },
                PieSlice {
                    name: "a".into(),
                    value: Duration::minutes(10)
                },
                PieSlice {
                    name: "b".into(),
                    value: Duration::minutes(10)
                },
            ]
        );
    }
}
