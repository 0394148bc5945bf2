use std::collections::HashSet;

use chrono::{DateTime, Duration, Utc};
use thiserror::Error;

use crate::model::{AnswerLog, DeckId};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum SessionSummaryError {
    #[error("completed_at is before started_at")]
    InvalidTimeRange,

    #[error("too many answers for a single session: {len}")]
    TooManyAnswers { len: usize },
}

/// Aggregate statistics for a finished study session.
///
/// Computed from the session's answer logs and handed back to the caller as
/// plain data; presentation (dialogs, navigation) stays with the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionSummary {
    deck_id: DeckId,
    started_at: DateTime<Utc>,
    completed_at: DateTime<Utc>,
    cards_studied: u32,
    total_answers: u32,
    correct_answers: u32,
    longest_streak: u32,
    deck_fully_mastered: bool,
}

impl SessionSummary {
    /// Build a summary from a session's answer logs.
    ///
    /// `correct_answers` counts successful recalls (learning or mastered);
    /// `longest_streak` is the longest run of consecutive successes.
    ///
    /// # Errors
    ///
    /// Returns `SessionSummaryError::InvalidTimeRange` if `completed_at`
    /// precedes `started_at`, and `SessionSummaryError::TooManyAnswers` if
    /// the log count does not fit in `u32`.
    pub fn from_logs(
        deck_id: DeckId,
        started_at: DateTime<Utc>,
        completed_at: DateTime<Utc>,
        logs: &[AnswerLog],
        deck_fully_mastered: bool,
    ) -> Result<Self, SessionSummaryError> {
        if completed_at < started_at {
            return Err(SessionSummaryError::InvalidTimeRange);
        }

        let total_answers = u32::try_from(logs.len())
            .map_err(|_| SessionSummaryError::TooManyAnswers { len: logs.len() })?;

        let mut cards = HashSet::new();
        let mut correct_answers = 0_u32;
        let mut streak = 0_u32;
        let mut longest_streak = 0_u32;

        for log in logs {
            cards.insert(log.card_id);
            if log.level.is_successful() {
                correct_answers = correct_answers.saturating_add(1);
                streak = streak.saturating_add(1);
                longest_streak = longest_streak.max(streak);
            } else {
                streak = 0;
            }
        }

        let cards_studied = u32::try_from(cards.len())
            .map_err(|_| SessionSummaryError::TooManyAnswers { len: cards.len() })?;

        Ok(Self {
            deck_id,
            started_at,
            completed_at,
            cards_studied,
            total_answers,
            correct_answers,
            longest_streak,
            deck_fully_mastered,
        })
    }

    #[must_use]
    pub fn deck_id(&self) -> DeckId {
        self.deck_id
    }

    #[must_use]
    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    #[must_use]
    pub fn completed_at(&self) -> DateTime<Utc> {
        self.completed_at
    }

    /// Distinct cards answered at least once.
    #[must_use]
    pub fn cards_studied(&self) -> u32 {
        self.cards_studied
    }

    #[must_use]
    pub fn total_answers(&self) -> u32 {
        self.total_answers
    }

    #[must_use]
    pub fn correct_answers(&self) -> u32 {
        self.correct_answers
    }

    #[must_use]
    pub fn longest_streak(&self) -> u32 {
        self.longest_streak
    }

    /// True when every card in the session's card set ended up mastered.
    #[must_use]
    pub fn deck_fully_mastered(&self) -> bool {
        self.deck_fully_mastered
    }

    /// Fraction of answers that were successful recalls, 0.0 when no answers.
    #[must_use]
    pub fn accuracy(&self) -> f64 {
        if self.total_answers == 0 {
            0.0
        } else {
            f64::from(self.correct_answers) / f64::from(self.total_answers)
        }
    }

    /// Wall-clock duration of the session.
    #[must_use]
    pub fn elapsed(&self) -> Duration {
        self.completed_at - self.started_at
    }
}
