use thiserror::Error;

use crate::model::{CardError, ReviewError, SessionSummaryError};
use crate::queue::QueueError;
use crate::scheduler::SchedulerError;

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Card(#[from] CardError),
    #[error(transparent)]
    Review(#[from] ReviewError),
    #[error(transparent)]
    Scheduler(#[from] SchedulerError),
    #[error(transparent)]
    Queue(#[from] QueueError),
    #[error(transparent)]
    Summary(#[from] SessionSummaryError),
}
