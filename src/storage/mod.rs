pub mod sheets;

#[cfg(test)]
pub mod memory;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;

/// One word/translation pair as read back from the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VocabularyEntry {
    pub id: String,
    pub word: String,
    pub translation: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Row handed to the store on submission. Carries the transcription column
/// the read side does not surface.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewEntry {
    pub id: String,
    pub word: String,
    pub translation: String,
    pub transcription: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl NewEntry {
    pub fn new(id: String, word: String, translation: String, now: DateTime<Utc>) -> Self {
        Self {
            id,
            word,
            translation,
            transcription: String::new(),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn to_entry(&self) -> VocabularyEntry {
        VocabularyEntry {
            id: self.id.clone(),
            word: self.word.clone(),
            translation: self.translation.clone(),
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RetrieveFilter {
    /// Keep only the most recent `limit` entries.
    pub limit: Option<usize>,
}

impl RetrieveFilter {
    pub fn latest(limit: usize) -> Self {
        Self { limit: Some(limit) }
    }
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("invalid service account credentials: {0}")]
    Credentials(String),

    #[error("authentication failed: {0}")]
    Auth(String),

    #[error("network error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error (HTTP {status}): {message}")]
    Api { status: u16, message: String },
}

/// Persistence backend for vocabulary entries.
#[async_trait]
pub trait VocabularyStore: Send + Sync {
    async fn save(&self, entry: &NewEntry) -> Result<(), StoreError>;

    /// Entries in store order. Malformed records are skipped, not reported.
    async fn retrieve(&self, filter: &RetrieveFilter) -> Result<Vec<VocabularyEntry>, StoreError>;
}

/// Applies `limit` by keeping the tail, preserving order.
pub(crate) fn keep_latest<T>(mut items: Vec<T>, filter: &RetrieveFilter) -> Vec<T> {
    if let Some(limit) = filter.limit {
        if items.len() > limit {
            items.drain(..items.len() - limit);
        }
    }
    items
}
