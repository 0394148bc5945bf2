use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::ids::CardId;

//
// ─── ERRORS ───────────────────────────────────────────────────────────────────
//

/// Errors that can occur while interpreting recall signals.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ReviewError {
    #[error("unknown recall level: {0}")]
    UnknownLevel(String),
}

//
// ─── RECALL LEVEL ─────────────────────────────────────────────────────────────
//

/// Three coarse outcome buckets for a user's answer.
///
/// Each level drives both the in-session requeue position and the durable
/// mastery state:
/// - `New`: failed to recall; the card goes back to the end of the queue.
/// - `Learning`: recalled with difficulty; reviewed again mid-session.
/// - `Mastered`: recalled confidently; done for the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecallLevel {
    New,
    Learning,
    Mastered,
}

impl RecallLevel {
    /// Maps this level to the 1-4 quality scale the scheduler consumes.
    #[must_use]
    pub fn quality(self) -> u8 {
        match self {
            RecallLevel::New => 1,
            RecallLevel::Learning => 3,
            RecallLevel::Mastered => 4,
        }
    }

    /// True when the answer counts as successful recall (quality >= 3).
    #[must_use]
    pub fn is_successful(self) -> bool {
        matches!(self, RecallLevel::Learning | RecallLevel::Mastered)
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            RecallLevel::New => "new",
            RecallLevel::Learning => "learning",
            RecallLevel::Mastered => "mastered",
        }
    }

    /// Parses the persisted string form.
    ///
    /// # Errors
    ///
    /// Returns `ReviewError::UnknownLevel` for anything but
    /// `new`/`learning`/`mastered`.
    pub fn parse(value: &str) -> Result<Self, ReviewError> {
        match value {
            "new" => Ok(Self::New),
            "learning" => Ok(Self::Learning),
            "mastered" => Ok(Self::Mastered),
            other => Err(ReviewError::UnknownLevel(other.to_string())),
        }
    }
}

//
// ─── ANSWER LOG ───────────────────────────────────────────────────────────────
//

/// Record of a single answer given during a session.
///
/// Used to derive session statistics; not persisted on its own.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnswerLog {
    pub card_id: CardId,
    pub level: RecallLevel,
    pub answered_at: DateTime<Utc>,
}

impl AnswerLog {
    #[must_use]
    pub fn new(card_id: CardId, level: RecallLevel, answered_at: DateTime<Utc>) -> Self {
        Self {
            card_id,
            level,
            answered_at,
        }
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quality_mapping_is_correct() {
        assert_eq!(RecallLevel::New.quality(), 1);
        assert_eq!(RecallLevel::Learning.quality(), 3);
        assert_eq!(RecallLevel::Mastered.quality(), 4);
    }

    #[test]
    fn success_threshold_matches_quality() {
        assert!(!RecallLevel::New.is_successful());
        assert!(RecallLevel::Learning.is_successful());
        assert!(RecallLevel::Mastered.is_successful());
    }

    #[test]
    fn string_round_trip() {
        for level in [
            RecallLevel::New,
            RecallLevel::Learning,
            RecallLevel::Mastered,
        ] {
            assert_eq!(RecallLevel::parse(level.as_str()).unwrap(), level);
        }

        let err = RecallLevel::parse("perfect").unwrap_err();
        assert!(matches!(err, ReviewError::UnknownLevel(_)));
    }

    #[test]
    fn log_creation_works() {
        let log = AnswerLog::new(CardId::new(10), RecallLevel::Learning, Utc::now());
        assert_eq!(log.card_id, CardId::new(10));
        assert_eq!(log.level, RecallLevel::Learning);
    }
}
