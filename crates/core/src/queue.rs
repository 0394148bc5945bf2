use std::collections::{HashMap, VecDeque};

use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::model::{CardId, RecallLevel};

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum QueueError {
    #[error("card {got} is not the current card (expected {expected})")]
    NotCurrentCard { expected: CardId, got: CardId },

    #[error("queue is empty; the session is already complete")]
    SessionComplete,
}

//
// ─── ATTEMPTS ──────────────────────────────────────────────────────────────────
//

/// In-session bookkeeping for one card.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CardAttempts {
    pub level: RecallLevel,
    pub attempts: u32,
    pub last_seen_at: DateTime<Utc>,
}

//
// ─── STUDY QUEUE ───────────────────────────────────────────────────────────────
//

/// Ordered queue of cards still to review in the current session.
///
/// The head is the current card. Answering it removes it from the head and,
/// depending on the recall level, reinserts it:
///
/// - `Mastered`: never reinserted; the card is done for the session.
/// - `Learning`: reinserted in the middle of what remains, so it comes back
///   before freshly failed cards but not immediately.
/// - `New` (failed): appended to the tail.
///
/// The queue holds card IDs only; it is discarded when the session ends and
/// never persisted.
#[derive(Debug, Clone, Default)]
pub struct StudyQueue {
    queue: VecDeque<CardId>,
    attempts: HashMap<CardId, CardAttempts>,
}

impl StudyQueue {
    /// Build a queue from card IDs in the given order.
    ///
    /// An empty input is valid: `current()` reports completion immediately.
    #[must_use]
    pub fn new(card_ids: impl IntoIterator<Item = CardId>) -> Self {
        Self {
            queue: card_ids.into_iter().collect(),
            attempts: HashMap::new(),
        }
    }

    /// The card to show next, or `None` once the session is complete.
    #[must_use]
    pub fn current(&self) -> Option<CardId> {
        self.queue.front().copied()
    }

    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.queue.is_empty()
    }

    /// Number of entries still queued (a card reinserted twice counts once).
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.queue.len()
    }

    /// Per-card attempt counts recorded so far this session.
    #[must_use]
    pub fn attempts(&self) -> &HashMap<CardId, CardAttempts> {
        &self.attempts
    }

    /// Record the answer for the current card and requeue it as needed.
    ///
    /// `card_id` must be the queue head; anything else is a caller bug and
    /// is rejected rather than silently reordered.
    ///
    /// # Errors
    ///
    /// Returns `QueueError::SessionComplete` when the queue is empty and
    /// `QueueError::NotCurrentCard` when `card_id` is not the head.
    pub fn record_answer(
        &mut self,
        card_id: CardId,
        level: RecallLevel,
        now: DateTime<Utc>,
    ) -> Result<(), QueueError> {
        let Some(&head) = self.queue.front() else {
            return Err(QueueError::SessionComplete);
        };
        if head != card_id {
            return Err(QueueError::NotCurrentCard {
                expected: head,
                got: card_id,
            });
        }

        self.queue.pop_front();

        self.attempts
            .entry(card_id)
            .and_modify(|entry| {
                entry.level = level;
                entry.attempts += 1;
                entry.last_seen_at = now;
            })
            .or_insert(CardAttempts {
                level,
                attempts: 1,
                last_seen_at: now,
            });

        match level {
            RecallLevel::Mastered => {}
            RecallLevel::Learning => {
                let middle = self.queue.len() / 2;
                self.queue.insert(middle, card_id);
            }
            RecallLevel::New => {
                self.queue.push_back(card_id);
            }
        }

        Ok(())
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
