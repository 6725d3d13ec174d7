//! Parsing and saving `word - translation` submissions.

use chrono::Utc;
use thiserror::Error;

use crate::storage::{NewEntry, StoreError, VocabularyEntry, VocabularyStore};

const SEPARATOR: &str = " - ";

#[derive(Debug, Error)]
pub enum SubmissionError {
    #[error("expected 'word - translation'")]
    ParseFailure,

    #[error("failed to save entry: {0}")]
    StoreWriteFailure(#[source] StoreError),
}

/// Splits on the first ` - `. Both halves are trimmed and must be non-empty.
pub fn parse_submission(raw_text: &str) -> Option<(String, String)> {
    let (word, translation) = raw_text.split_once(SEPARATOR)?;
    let (word, translation) = (word.trim(), translation.trim());
    if word.is_empty() || translation.is_empty() {
        return None;
    }
    Some((word.to_string(), translation.to_string()))
}

/// Parses `raw_text` and persists it under `id`. Nothing is written when the
/// text does not parse; a failed write is reported, not retried.
pub async fn record_new_entry<S: VocabularyStore + ?Sized>(
    store: &S,
    id: String,
    raw_text: &str,
) -> Result<VocabularyEntry, SubmissionError> {
    let (word, translation) = parse_submission(raw_text).ok_or(SubmissionError::ParseFailure)?;
    let entry = NewEntry::new(id, word, translation, Utc::now());

    store
        .save(&entry)
        .await
        .map_err(SubmissionError::StoreWriteFailure)?;

    Ok(entry.to_entry())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::memory::InMemoryStore;

    #[test]
    fn parses_word_and_translation() {
        assert_eq!(
            parse_submission("hola - hello"),
            Some(("hola".to_string(), "hello".to_string()))
        );
    }

    #[test]
    fn strips_extra_whitespace_around_parts() {
        assert_eq!(
            parse_submission("   buenos días   -    good morning  "),
            Some(("buenos días".to_string(), "good morning".to_string()))
        );
    }

    #[test]
    fn splits_only_on_first_separator() {
        assert_eq!(
            parse_submission("a - b - c"),
            Some(("a".to_string(), "b - c".to_string()))
        );
    }

    #[test]
    fn hyphenated_words_survive() {
        assert_eq!(
            parse_submission("well-known - bien connu"),
            Some(("well-known".to_string(), "bien connu".to_string()))
        );
    }

    #[test]
    fn rejects_text_without_separator() {
        assert_eq!(parse_submission("hola"), None);
        assert_eq!(parse_submission("hola-hello"), None);
        assert_eq!(parse_submission(""), None);
    }

    #[test]
    fn rejects_empty_halves() {
        assert_eq!(parse_submission(" - hello"), None);
        assert_eq!(parse_submission("hola -  "), None);
    }

    #[tokio::test]
    async fn saves_parsed_entry() {
        let store = InMemoryStore::new();

        let entry = record_new_entry(&store, "17".to_string(), "hola - hello")
            .await
            .unwrap();

        assert_eq!(entry.word, "hola");
        assert_eq!(entry.translation, "hello");
        assert_eq!(entry.created_at, entry.updated_at);

        let rows = store.rows();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].id, "17");
        assert_eq!(rows[0].transcription, "");
    }

    #[tokio::test]
    async fn malformed_text_never_touches_store() {
        let store = InMemoryStore::new();

        for text in ["hola", "hola-hello", " - ", "just some words"] {
            let result = record_new_entry(&store, "1".to_string(), text).await;
            assert!(matches!(result, Err(SubmissionError::ParseFailure)));
        }
        assert_eq!(store.save_calls(), 0);
    }

    #[tokio::test]
    async fn write_failure_is_reported_once() {
        let store = InMemoryStore::new();
        store.fail_writes(true);

        let result = record_new_entry(&store, "1".to_string(), "hola - hello").await;

        assert!(matches!(result, Err(SubmissionError::StoreWriteFailure(_))));
        assert_eq!(store.save_calls(), 1);
        assert!(store.rows().is_empty());
    }
}
