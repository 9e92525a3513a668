use anyhow::Result;
use async_trait::async_trait;
use chrono::NaiveDate;

use super::entities::SessionRecord;

/// Selects which sessions a [RecordSource] returns.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum SessionFilter {
    #[default]
    All,
    /// Only sessions assigned to the given board.
    Board(String),
}

impl SessionFilter {
    pub fn matches(&self, record: &SessionRecord) -> bool {
        match self {
            SessionFilter::All => true,
            SessionFilter::Board(id) => record.board_id.as_deref() == Some(id.as_str()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FindOptions {
    /// Sessions started before this UTC date may be skipped by the source.
    pub since: Option<NaiveDate>,
}

/// Interface for the store that owns session records. The returned batch is unordered.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RecordSource: Send + Sync {
    async fn find(
        &self,
        filter: &SessionFilter,
        options: &FindOptions,
    ) -> Result<Vec<SessionRecord>>;
}
