//! Shared error types for the services crate.

use thiserror::Error;

use storage::repository::StorageError;
use vocab_core::model::{CardError, SessionSummaryError};
use vocab_core::queue::QueueError;
use vocab_core::scheduler::SchedulerError;

/// Errors emitted by card sources.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum DeckSourceError {
    #[error("card source request failed with status {0}")]
    HttpStatus(reqwest::StatusCode),

    #[error(transparent)]
    Http(#[from] reqwest::Error),

    #[error("card payload could not be decoded: {0}")]
    Decode(#[from] serde_json::Error),

    #[error(transparent)]
    Card(#[from] CardError),
}

/// Errors emitted by study sessions and the session loop.
///
/// Storage variants are recoverable: a failed save leaves the in-memory
/// session untouched so the caller can retry.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SessionError {
    #[error("session already completed")]
    Completed,

    #[error("session is still in progress")]
    InProgress,

    #[error(transparent)]
    Scheduler(#[from] SchedulerError),

    #[error(transparent)]
    Queue(#[from] QueueError),

    #[error(transparent)]
    Summary(#[from] SessionSummaryError),

    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error(transparent)]
    Source(#[from] DeckSourceError),
}
