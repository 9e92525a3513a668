use std::collections::HashMap;

use tracing::trace;

use crate::storage::entities::SessionRecord;

use super::{config::WordConfig, WordWeight};

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

/// Splits text into lowercase tokens, dropping short tokens and stop words.
pub fn tokenize<'a>(text: &'a str, config: &'a WordConfig) -> impl Iterator<Item = String> + 'a {
    text.split(|c: char| !is_word_char(c))
        .filter(|v| !v.is_empty())
        .map(str::to_lowercase)
        .filter(move |v| {
            v.chars().count() >= config.min_token_len && !config.stop_words.contains(v)
        })
}

/// Builds the word cloud weights of a batch of sessions. The most frequent words come first,
/// words of equal frequency are ordered lexically, and everything after `config.cap` is dropped.
pub fn weigh<'a>(
    records: impl IntoIterator<Item = &'a SessionRecord>,
    config: &WordConfig,
) -> Vec<WordWeight> {
    let mut frequencies = HashMap::<String, u32>::new();
    for text in records
        .into_iter()
        .filter_map(|v| v.text.as_deref())
        .filter(|v| !v.trim().is_empty())
    {
        for token in tokenize(text, config) {
            *frequencies.entry(token).or_insert(0) += 1;
        }
    }
    trace!("Counted {} distinct words", frequencies.len());

    let mut ranked = frequencies.into_iter().collect::<Vec<_>>();
    ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    ranked.truncate(config.cap);

    let top = ranked.first().map(|v| v.1).unwrap_or(0);
    ranked
        .into_iter()
        .map(|(text, frequency)| WordWeight {
            text,
            value: weight(frequency, top, config.normalize_to),
        })
        .collect()
}

fn weight(frequency: u32, top: u32, normalize_to: Option<f64>) -> f64 {
    match normalize_to {
        Some(scale) if top > 0 => frequency as f64 * scale / top as f64,
        _ => frequency as f64,
    }
}
