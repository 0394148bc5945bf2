use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;

use vocab_core::model::{CardId, DeckId, DeckProgress, SessionOutcome, StudyMethod};

/// Errors surfaced by storage adapters.
///
/// Storage failures are environmental: a session must be able to keep its
/// in-memory state and retry after any of these.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StorageError {
    #[error("storage unavailable: {0}")]
    Unavailable(String),

    #[error("write failed: {0}")]
    WriteFailed(String),

    #[error("serialization error: {0}")]
    Serialization(String),

    #[error("progress under {key} was changed by another session")]
    ConcurrentOverwrite { key: String },
}

/// The durable key-value boundary progress is persisted through.
///
/// Any medium works: an embedded database, a file, a remote API. Values are
/// opaque strings; `ProgressStore` owns the schema.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Fetch the value under `key`, or `None` if absent.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Unavailable` when the medium cannot be read.
    async fn get(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Write `value` under `key`, replacing any prior value.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::WriteFailed` when the write is rejected.
    async fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;
}

/// Simple in-memory store for testing and prototyping.
#[derive(Clone, Default)]
pub struct InMemoryStore {
    entries: Arc<Mutex<HashMap<String, String>>>,
}

impl InMemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self {
            entries: Arc::new(Mutex::new(HashMap::new())),
        }
    }
}

#[async_trait]
impl KeyValueStore for InMemoryStore {
    async fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let guard = self
            .entries
            .lock()
            .map_err(|e| StorageError::Unavailable(e.to_string()))?;
        Ok(guard.get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let mut guard = self
            .entries
            .lock()
            .map_err(|e| StorageError::Unavailable(e.to_string()))?;
        guard.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// Deck-scoped progress persistence over any [`KeyValueStore`].
///
/// One record per deck per study method, stored as a JSON payload under
/// `progress:{method}:{deck}`. Merges are last-writer-wins at deck
/// granularity; use [`ProgressStore::merge_checked`] to detect a concurrent
/// session's merge instead of silently discarding it.
#[derive(Clone)]
pub struct ProgressStore {
    kv: Arc<dyn KeyValueStore>,
}

impl ProgressStore {
    #[must_use]
    pub fn new(kv: Arc<dyn KeyValueStore>) -> Self {
        Self { kv }
    }

    /// In-memory backed store for tests and prototyping.
    #[must_use]
    pub fn in_memory() -> Self {
        Self::new(Arc::new(InMemoryStore::new()))
    }

    fn storage_key(deck_id: DeckId, method: StudyMethod) -> String {
        format!("progress:{}:{}", method.as_str(), deck_id)
    }

    /// Load the durable progress for a deck.
    ///
    /// A missing record is not an error; it loads as empty progress.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Unavailable` when the medium cannot be read and
    /// `StorageError::Serialization` when the stored payload does not parse.
    pub async fn load(
        &self,
        deck_id: DeckId,
        method: StudyMethod,
    ) -> Result<DeckProgress, StorageError> {
        let key = Self::storage_key(deck_id, method);
        match self.kv.get(&key).await? {
            Some(payload) => serde_json::from_str(&payload)
                .map_err(|e| StorageError::Serialization(e.to_string())),
            None => Ok(DeckProgress::default()),
        }
    }

    /// Merge one session's outcomes into the deck's durable progress.
    ///
    /// Reads the current record, folds the outcomes in (additive
    /// `repetitions`, overwrite-by-latest `level`/`last_studied_at`), and
    /// writes the result back, replacing the prior value entirely.
    ///
    /// # Errors
    ///
    /// Propagates read, parse, and write errors; on failure the stored
    /// record is either the old or the new value, never a partial one.
    pub async fn merge(
        &self,
        deck_id: DeckId,
        method: StudyMethod,
        outcomes: &HashMap<CardId, SessionOutcome>,
        now: DateTime<Utc>,
    ) -> Result<DeckProgress, StorageError> {
        self.merge_inner(deck_id, method, None, outcomes, now).await
    }

    /// Like [`ProgressStore::merge`], but refuses to clobber a record another
    /// session merged since this session loaded version `base_version`.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::ConcurrentOverwrite` when the stored version no
    /// longer matches `base_version`; otherwise as [`ProgressStore::merge`].
    pub async fn merge_checked(
        &self,
        deck_id: DeckId,
        method: StudyMethod,
        base_version: u64,
        outcomes: &HashMap<CardId, SessionOutcome>,
        now: DateTime<Utc>,
    ) -> Result<DeckProgress, StorageError> {
        self.merge_inner(deck_id, method, Some(base_version), outcomes, now)
            .await
    }

    async fn merge_inner(
        &self,
        deck_id: DeckId,
        method: StudyMethod,
        base_version: Option<u64>,
        outcomes: &HashMap<CardId, SessionOutcome>,
        now: DateTime<Utc>,
    ) -> Result<DeckProgress, StorageError> {
        let key = Self::storage_key(deck_id, method);
        let mut progress = self.load(deck_id, method).await?;

        if let Some(base) = base_version {
            if progress.version != base {
                return Err(StorageError::ConcurrentOverwrite { key });
            }
        }

        progress.merge_session(outcomes, now);

        let payload = serde_json::to_string(&progress)
            .map_err(|e| StorageError::Serialization(e.to_string()))?;
        self.kv.set(&key, &payload).await?;

        Ok(progress)
    }
}
