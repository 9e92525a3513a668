use chrono::DateTime;
use chrono::Duration;
use chrono::Utc;
use serde::Deserialize;
use serde::Serialize;

/// A single completed pomodoro session as it is kept in the record store. Records are read-only
/// for everything downstream of the store.
#[derive(PartialEq, Eq, Debug, Serialize, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct SessionRecord {
    pub id: String,
    /// Board (project) the session was spent on. `None` means the session is unassigned.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub board_id: Option<String>,
    /// Application the session was spent in, if it was tracked.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub app_name: Option<String>,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub started_at: DateTime<Utc>,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub ended_at: DateTime<Utc>,
    /// Title, notes or tags of the session.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

impl SessionRecord {
    pub fn new(id: impl Into<String>, started_at: DateTime<Utc>, ended_at: DateTime<Utc>) -> Self {
        Self {
            id: id.into(),
            board_id: None,
            app_name: None,
            started_at,
            ended_at,
            text: None,
        }
    }

    /// Raw length of the session. Can be negative for corrupted records.
    pub fn span(&self) -> Duration {
        self.ended_at - self.started_at
    }

    pub fn with_board(self, board_id: impl Into<String>) -> Self {
        Self {
            board_id: Some(board_id.into()),
            ..self
        }
    }

    pub fn with_app(self, app_name: impl Into<String>) -> Self {
        Self {
            app_name: Some(app_name.into()),
            ..self
        }
    }

    pub fn with_text(self, text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            ..self
        }
    }

    pub fn with_duration(self, duration: Duration) -> Self {
        Self {
            ended_at: self.started_at + duration,
            ..self
        }
    }
}
