use std::collections::HashSet;

use chrono::Weekday;

use super::AggregationError;

/// Maximum amount of words handed to the word cloud.
pub const DEFAULT_WORD_CAP: usize = 100;
/// Tokens shorter than this are dropped from the word cloud.
pub const DEFAULT_MIN_TOKEN_LEN: usize = 2;
/// Weight given to the most frequent word.
pub const DEFAULT_NORMALIZATION: f64 = 100.;

const ENGLISH_STOP_WORDS: &[&str] = &[
    "the", "a", "an", "and", "or", "but", "in", "on", "at", "to", "for", "of", "with", "by",
    "from", "is", "it", "as", "was", "be", "are", "been", "have", "has", "had", "do", "does",
    "did", "will", "would", "could", "should", "can", "this", "that", "these", "those", "i",
    "you", "he", "she", "we", "they", "what", "which", "who", "when", "where", "why", "how",
    "all", "some", "no", "not", "so", "than", "too", "very", "just", "also", "then", "about",
    "after", "into", "over", "up", "out", "its", "your", "my", "our", "their", "me", "us", "if",
];

/// Which days count as "this week".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WeekWindow {
    /// The calendar week containing the reference day, starting on the given weekday.
    StartingOn(Weekday),
    /// The reference day and the 6 days before it.
    Trailing,
}

impl Default for WeekWindow {
    fn default() -> Self {
        Self::StartingOn(Weekday::Mon)
    }
}

/// Length of the activity calendar. The calendar always ends on the reference day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CalendarWindow {
    /// One calendar year, so 365 or 366 days.
    #[default]
    Year,
    Days(u32),
}

/// Words that carry no meaning of their own and are excluded from the word cloud.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StopWords(HashSet<String>);

impl StopWords {
    pub fn english() -> Self {
        Self(ENGLISH_STOP_WORDS.iter().map(|v| v.to_string()).collect())
    }

    pub fn none() -> Self {
        Self(HashSet::new())
    }

    /// Parses a newline separated list. Empty lines and lines starting with `#` are skipped.
    pub fn from_list(list: &str) -> Self {
        Self(
            list.lines()
                .map(str::trim)
                .filter(|v| !v.is_empty() && !v.starts_with('#'))
                .map(str::to_lowercase)
                .collect(),
        )
    }

    /// Expects an already lowercased token.
    pub fn contains(&self, token: &str) -> bool {
        self.0.contains(token)
    }
}

impl Default for StopWords {
    fn default() -> Self {
        Self::english()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct WordConfig {
    pub cap: usize,
    pub min_token_len: usize,
    /// Weight of the most frequent word. Raw frequencies are used when `None`.
    pub normalize_to: Option<f64>,
    pub stop_words: StopWords,
}

impl Default for WordConfig {
    fn default() -> Self {
        Self {
            cap: DEFAULT_WORD_CAP,
            min_token_len: DEFAULT_MIN_TOKEN_LEN,
            normalize_to: Some(DEFAULT_NORMALIZATION),
            stop_words: StopWords::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct AggregationConfig {
    pub week: WeekWindow,
    pub calendar: CalendarWindow,
    pub words: WordConfig,
}

impl AggregationConfig {
    pub fn validate(&self) -> Result<(), AggregationError> {
        if self.calendar == CalendarWindow::Days(0) {
            return Err(AggregationError::InvalidConfig(
                "calendar has to span at least one day".into(),
            ));
        }
        if let Some(v) = self.words.normalize_to {
            if !v.is_finite() || v <= 0. {
                return Err(AggregationError::InvalidConfig(format!(
                    "word weights can't be normalized to {v}"
                )));
            }
        }
        Ok(())
    }
}
