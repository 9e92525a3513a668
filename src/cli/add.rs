use std::path::Path;

use anyhow::Result;
use chrono::{Duration, Local};
use clap::Parser;
use tracing::info;
use uuid::Uuid;

use crate::storage::{entities::SessionRecord, session_storage::SessionStorageImpl};

use super::{parse_date, validation_error, DateStyle, RECORDS_DIR};

/// Length of a classic pomodoro.
const DEFAULT_SESSION_MINUTES: u32 = 25;

#[derive(Debug, Parser)]
pub struct AddCommand {
    #[arg(
        long,
        short,
        help = "Start of the session. Examples are \"1 hour ago\", \"12:00 16/03/2025\""
    )]
    start: String,
    #[arg(long, short, conflicts_with = "minutes", help = "End of the session")]
    end: Option<String>,
    #[arg(long, short, default_value_t = DEFAULT_SESSION_MINUTES, help = "Length of the session in minutes")]
    minutes: u32,
    #[arg(long, short, help = "Application the session was spent in")]
    app: Option<String>,
    #[arg(long, short, help = "Id of the board the session belongs to")]
    board: Option<String>,
    #[arg(long, short, help = "Title, notes or tags of the session")]
    text: Option<String>,
    #[arg(long, default_value_t = DateStyle::Uk, help = "Style of dates used during parsing. For Uk it's day/month/year. For Us it's month/day/year")]
    date_style: DateStyle,
}

/// Command to process `add` command. Stores a finished session.
pub async fn process_add_command(command: AddCommand, app_dir: &Path) -> Result<()> {
    let record = create_record(command)?;
    let storage = SessionStorageImpl::new(app_dir.join(RECORDS_DIR))?;
    storage.append(&record).await?;
    info!("Added session {record:?}");
    println!("Added session {}", record.id);
    Ok(())
}

fn create_record(
    AddCommand {
        start,
        end,
        minutes,
        app,
        board,
        text,
        date_style,
    }: AddCommand,
) -> Result<SessionRecord> {
    let now = Local::now();
    let started_at = parse_date(&start, now, date_style, "start")?;
    let ended_at = match end {
        Some(end) => parse_date(&end, now, date_style, "end")?,
        None => started_at + Duration::minutes(minutes.into()),
    };
    if ended_at < started_at {
        return Err(validation_error(format!(
            "Session can't end at {ended_at} before it starts at {started_at}"
        )));
    }

    Ok(SessionRecord {
        id: Uuid::new_v4().to_string(),
        board_id: board,
        app_name: app,
        started_at: started_at.to_utc(),
        ended_at: ended_at.to_utc(),
        text,
    })
}

#[cfg(test)]
mod tests {
    use anyhow::Result;
    use chrono::Duration;
    use clap::Parser;
    use tempfile::tempdir;

    use crate::{
        cli::RECORDS_DIR,
        storage::{
            record_source::{FindOptions, RecordSource, SessionFilter},
            session_storage::SessionStorageImpl,
        },
    };

    use super::{create_record, process_add_command, AddCommand};

    #[test]
    fn default_length_is_one_pomodoro() -> Result<()> {
        let record = create_record(AddCommand::try_parse_from([
            "add", "--start", "15/03/2025", "--app", "Editor",
        ])?)?;
        assert_eq!(record.span(), Duration::minutes(25));
        assert_eq!(record.app_name.as_deref(), Some("Editor"));
        assert_eq!(record.board_id, None);
        Ok(())
    }

    #[test]
    fn end_before_start_is_rejected() -> Result<()> {
        let command = AddCommand::try_parse_from([
            "add",
            "--start",
            "16/03/2025",
            "--end",
            "15/03/2025",
        ])?;
        assert!(create_record(command).is_err());
        Ok(())
    }

    #[test]
    fn end_and_minutes_conflict() {
        let parsed = AddCommand::try_parse_from([
            "add", "--start", "15/03/2025", "--end", "16/03/2025", "--minutes", "5",
        ]);
        assert!(parsed.is_err());
    }

    #[tokio::test]
    async fn added_sessions_are_stored() -> Result<()> {
        let dir = tempdir()?;
        let command = AddCommand::try_parse_from([
            "add",
            "--start",
            "15/03/2025",
            "--minutes",
            "50",
            "--board",
            "b1",
            "--text",
            "write chapter",
        ])?;
        process_add_command(command, dir.path()).await?;

        let storage = SessionStorageImpl::new(dir.path().join(RECORDS_DIR))?;
        let stored = storage
            .find(&SessionFilter::Board("b1".into()), &FindOptions::default())
            .await?;
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].span(), Duration::minutes(50));
        assert_eq!(stored[0].text.as_deref(), Some("write chapter"));
        Ok(())
    }
}
