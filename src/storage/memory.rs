//! In-memory store used by tests.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{TimeZone, Utc};

use super::{keep_latest, NewEntry, RetrieveFilter, StoreError, VocabularyEntry, VocabularyStore};

#[derive(Default)]
pub struct InMemoryStore {
    rows: Mutex<Vec<NewEntry>>,
    save_calls: AtomicUsize,
    fail_writes: AtomicBool,
    fail_reads: AtomicBool,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store pre-seeded with `(word, translation)` pairs.
    pub fn with_pairs(pairs: &[(&str, &str)]) -> Self {
        let store = Self::new();
        {
            let mut rows = store.rows.lock().unwrap();
            for (i, (word, translation)) in pairs.iter().enumerate() {
                let at = Utc.timestamp_opt(1_700_000_000 + i as i64, 0).unwrap();
                rows.push(NewEntry::new(
                    format!("seed-{}", i),
                    word.to_string(),
                    translation.to_string(),
                    at,
                ));
            }
        }
        store
    }

    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::Relaxed);
    }

    pub fn fail_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::Relaxed);
    }

    pub fn save_calls(&self) -> usize {
        self.save_calls.load(Ordering::Relaxed)
    }

    pub fn rows(&self) -> Vec<NewEntry> {
        self.rows.lock().unwrap().clone()
    }
}

#[async_trait]
impl VocabularyStore for InMemoryStore {
    async fn save(&self, entry: &NewEntry) -> Result<(), StoreError> {
        self.save_calls.fetch_add(1, Ordering::Relaxed);
        if self.fail_writes.load(Ordering::Relaxed) {
            return Err(StoreError::Api {
                status: 503,
                message: "write rejected".to_string(),
            });
        }
        self.rows.lock().unwrap().push(entry.clone());
        Ok(())
    }

    async fn retrieve(&self, filter: &RetrieveFilter) -> Result<Vec<VocabularyEntry>, StoreError> {
        if self.fail_reads.load(Ordering::Relaxed) {
            return Err(StoreError::Api {
                status: 503,
                message: "read rejected".to_string(),
            });
        }
        let entries = self.rows.lock().unwrap().iter().map(NewEntry::to_entry).collect();
        Ok(keep_latest(entries, filter))
    }
}
