//! Statistics of pomodoro sessions: how many sessions were finished today, this week and this
//! month, a year long activity calendar, time spent per application and per project, and the
//! words that come up most often in session notes.
//!
//! The entry points are [aggregation::get_aggregated_info] for a batch that is already loaded
//! and [aggregation::query_aggregated_info] for loading the batch from a
//! [storage::record_source::RecordSource] first.

pub mod aggregation;
pub mod boards;
pub mod cli;
pub mod storage;
pub mod utils;
