use std::{
    io::ErrorKind,
    path::{Path, PathBuf},
};

use anyhow::Result;
use async_trait::async_trait;
use chrono::NaiveDate;
use fs4::tokio::AsyncFileExt;
use futures::{stream, StreamExt};
use tokio::{
    fs::File,
    io::{AsyncBufReadExt, AsyncWriteExt, BufReader},
};
use tracing::{debug, error, instrument, warn};

use crate::utils::time::{date_to_record_name, record_name_to_date};

use super::{
    entities::SessionRecord,
    record_source::{FindOptions, RecordSource, SessionFilter},
};

/// Number of day files that are read at the same time.
const CONCURRENT_READS: usize = 4;

/// File backed [RecordSource]. Every UTC day of session starts gets its own file with one json
/// record per line.
pub struct SessionStorageImpl {
    record_dir: PathBuf,
}

impl SessionStorageImpl {
    pub fn new(record_dir: PathBuf) -> Result<Self, std::io::Error> {
        std::fs::create_dir_all(&record_dir)?;

        Ok(Self { record_dir })
    }

    /// Appends a session into the file of the day it started on.
    pub async fn append(&self, record: &SessionRecord) -> Result<()> {
        let path = self
            .record_dir
            .join(date_to_record_name(record.started_at.date_naive()));

        let mut line = serde_json::to_vec(record)?;
        line.push(b'\n');

        let mut file = File::options()
            .append(true)
            .create(true)
            .open(&path)
            .await?;

        file.lock_exclusive()?;
        let result = async {
            file.write_all(&line).await?;
            file.flush().await
        }
        .await;
        file.unlock_async().await?;

        debug!("Appended session {} into {path:?}", record.id);
        Ok(result?)
    }

    /// Retrieves sessions stored for a certain day.
    pub async fn get_data_for(&self, date: NaiveDate) -> Result<Vec<SessionRecord>> {
        let path = self.record_dir.join(date_to_record_name(date));
        match Self::extract(&path).await {
            Ok(records) => Ok(records),
            // The file might be gone between listing and reading.
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(vec![]),
            Err(e) => Err(e.into()),
        }
    }

    async fn extract(path: &Path) -> std::result::Result<Vec<SessionRecord>, std::io::Error> {
        debug!("Extracting {path:?}");
        let file = File::open(path).await?;
        file.lock_shared()?;
        let buffer = BufReader::new(file);
        let mut lines = buffer.lines();
        let mut records = vec![];
        while let Some(line) = lines.next_line().await? {
            if line.trim().is_empty() {
                continue;
            }
            match serde_json::from_str::<SessionRecord>(&line) {
                Ok(v) => records.push(v),
                Err(e) => {
                    // A write interrupted by a shutdown leaves a partial line behind.
                    warn!("Skipping illegal session in {path:?} {line}: {e}")
                }
            }
        }

        lines.into_inner().into_inner().unlock_async().await?;

        Ok(records)
    }

    /// Lists days that have a record file, in ascending order.
    async fn stored_days(&self, since: Option<NaiveDate>) -> Result<Vec<NaiveDate>> {
        let mut entries = tokio::fs::read_dir(&self.record_dir).await?;
        let mut days = vec![];
        while let Some(entry) = entries.next_entry().await? {
            let name = entry.file_name();
            let Some(day) = name.to_str().and_then(record_name_to_date) else {
                debug!("Ignoring {name:?} in record directory");
                continue;
            };
            if since.is_some_and(|since| day < since) {
                continue;
            }
            days.push(day);
        }
        days.sort();
        Ok(days)
    }
}

#[async_trait]
impl RecordSource for SessionStorageImpl {
    #[instrument(skip(self))]
    async fn find(
        &self,
        filter: &SessionFilter,
        options: &FindOptions,
    ) -> Result<Vec<SessionRecord>> {
        let days = self.stored_days(options.since).await?;

        let files = stream::iter(days)
            .map(move |day| async move { (day, self.get_data_for(day).await) })
            .buffered(CONCURRENT_READS);
        let mut files = std::pin::pin!(files);

        let mut records = vec![];
        while let Some((day, data)) = files.next().await {
            match data {
                Ok(data) => records.extend(data.into_iter().filter(|v| filter.matches(v))),
                Err(e) => {
                    error!("Failed to read sessions of {day} {e}");
                    return Err(e);
                }
            }
        }
        debug!("Found {} sessions", records.len());
        Ok(records)
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use anyhow::Result;
    use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc};
    use tempfile::tempdir;

    use crate::{
        storage::{
            entities::SessionRecord,
            record_source::{FindOptions, RecordSource, SessionFilter},
        },
        utils::logging::TEST_LOGGING,
    };

    use super::SessionStorageImpl;

    const TEST_START_DATE: NaiveDateTime = NaiveDateTime::new(
        NaiveDate::from_ymd_opt(2018, 7, 4).unwrap(),
        NaiveTime::from_hms_opt(9, 0, 0).unwrap(),
    );

    fn session(id: &str, days_later: i64) -> SessionRecord {
        let start = Utc.from_utc_datetime(&TEST_START_DATE) + Duration::days(days_later);
        SessionRecord::new(id, start, start).with_duration(Duration::minutes(25))
    }

    fn sorted(mut records: Vec<SessionRecord>) -> Vec<SessionRecord> {
        records.sort_by(|a, b| a.id.cmp(&b.id));
        records
    }

    #[tokio::test]
    async fn test_storage_round_trip() -> Result<()> {
        *TEST_LOGGING;
        let dir = tempdir()?;
        let storage = SessionStorageImpl::new(dir.path().to_owned())?;
        let records = vec![
            session("a", 0).with_app("Editor").with_board("board-1"),
            session("b", 0).with_text("review pull request"),
            session("c", 3).with_board("board-2"),
        ];
        for record in &records {
            storage.append(record).await?;
        }

        let files = std::fs::read_dir(dir.path())?.count();
        assert_eq!(files, 2);

        let found = storage
            .find(&SessionFilter::All, &FindOptions::default())
            .await?;
        assert_eq!(sorted(found), records);
        Ok(())
    }

    #[tokio::test]
    async fn test_storage_board_filter() -> Result<()> {
        let dir = tempdir()?;
        let storage = SessionStorageImpl::new(dir.path().to_owned())?;
        let assigned = session("a", 0).with_board("board-1");
        storage.append(&assigned).await?;
        storage.append(&session("b", 1)).await?;
        storage.append(&session("c", 2).with_board("board-2")).await?;

        let found = storage
            .find(
                &SessionFilter::Board("board-1".into()),
                &FindOptions::default(),
            )
            .await?;
        assert_eq!(found, vec![assigned]);
        Ok(())
    }

    #[tokio::test]
    async fn test_storage_since_skips_older_days() -> Result<()> {
        let dir = tempdir()?;
        let storage = SessionStorageImpl::new(dir.path().to_owned())?;
        storage.append(&session("old", 0)).await?;
        storage.append(&session("new", 5)).await?;

        let found = storage
            .find(
                &SessionFilter::All,
                &FindOptions {
                    since: Some(TEST_START_DATE.date() + Duration::days(1)),
                },
            )
            .await?;
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].id, "new");
        Ok(())
    }

    #[tokio::test]
    async fn test_storage_skips_corrupted_lines_and_foreign_files() -> Result<()> {
        let dir = tempdir()?;
        let storage = SessionStorageImpl::new(dir.path().to_owned())?;
        let record = session("a", 0);
        storage.append(&record).await?;

        let mut file = std::fs::OpenOptions::new()
            .append(true)
            .open(dir.path().join("2018-07-04"))?;
        file.write_all(b"{\"id\":\"broken\",\"startedAt\":15\n")?;
        std::fs::write(dir.path().join("notes.txt"), "not a record file")?;

        let found = storage
            .find(&SessionFilter::All, &FindOptions::default())
            .await?;
        assert_eq!(found, vec![record]);
        Ok(())
    }

    #[tokio::test]
    async fn test_missing_day_file_is_empty() -> Result<()> {
        let dir = tempdir()?;
        let storage = SessionStorageImpl::new(dir.path().to_owned())?;
        storage.append(&session("a", 0)).await?;

        let missing = storage
            .get_data_for(TEST_START_DATE.date() + Duration::days(1))
            .await?;
        assert_eq!(missing, vec![]);

        std::fs::remove_file(dir.path().join("2018-07-04"))?;
        assert_eq!(storage.get_data_for(TEST_START_DATE.date()).await?, vec![]);
        Ok(())
    }

    #[tokio::test]
    async fn test_storage_empty_directory() -> Result<()> {
        let dir = tempdir()?;
        let storage = SessionStorageImpl::new(dir.path().join("records"))?;
        let found = storage
            .find(&SessionFilter::All, &FindOptions::default())
            .await?;
        assert!(found.is_empty());
        Ok(())
    }
}
