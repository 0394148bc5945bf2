use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::model::ids::CardId;
use crate::model::review::RecallLevel;
use crate::scheduler::ScheduleState;

//
// ─── STUDY METHOD ──────────────────────────────────────────────────────────────
//

/// The study mode a progress record belongs to.
///
/// Each method tracks mastery independently; the storage key is scoped by
/// method so flashcard progress never shadows writing progress for the same
/// deck.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StudyMethod {
    Flashcard,
    Spaced,
    Writing,
}

impl StudyMethod {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            StudyMethod::Flashcard => "flashcard",
            StudyMethod::Spaced => "spaced",
            StudyMethod::Writing => "writing",
        }
    }
}

//
// ─── PER-CARD PROGRESS ─────────────────────────────────────────────────────────
//

/// Durable per-card mastery record.
///
/// `repetitions` is the cumulative number of answers ever recorded for the
/// card, across all sessions; it is distinct from
/// `ScheduleState::repetitions`, which counts consecutive SM-2 successes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CardProgress {
    pub level: RecallLevel,
    pub last_studied_at: DateTime<Utc>,
    pub repetitions: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schedule: Option<ScheduleState>,
}

/// Delta produced by one session for one card, handed to the merge.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionOutcome {
    pub level: RecallLevel,
    pub session_attempts: u32,
    pub schedule: Option<ScheduleState>,
}

//
// ─── DECK PROGRESS ─────────────────────────────────────────────────────────────
//

/// All durable progress for one deck under one study method.
///
/// `version` increments on every merge; callers that kept the version they
/// loaded can detect a concurrent session's merge before overwriting it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DeckProgress {
    pub version: u64,
    pub cards: HashMap<CardId, CardProgress>,
}

impl DeckProgress {
    /// Fold one session's outcomes into this record.
    ///
    /// Per card: `repetitions` is additive, `level`, `last_studied_at`, and
    /// the schedule are overwrite-by-latest. Cards untouched by the session
    /// are left as they were.
    pub fn merge_session(
        &mut self,
        outcomes: &HashMap<CardId, SessionOutcome>,
        now: DateTime<Utc>,
    ) {
        for (card_id, outcome) in outcomes {
            match self.cards.get_mut(card_id) {
                Some(existing) => {
                    existing.repetitions =
                        existing.repetitions.saturating_add(outcome.session_attempts);
                    existing.level = outcome.level;
                    existing.last_studied_at = now;
                    if outcome.schedule.is_some() {
                        existing.schedule = outcome.schedule.clone();
                    }
                }
                None => {
                    self.cards.insert(
                        *card_id,
                        CardProgress {
                            level: outcome.level,
                            last_studied_at: now,
                            repetitions: outcome.session_attempts,
                            schedule: outcome.schedule.clone(),
                        },
                    );
                }
            }
        }
        self.version += 1;
    }

    /// True when every card in `card_ids` has reached `Mastered`.
    pub fn is_fully_mastered<'a>(&self, card_ids: impl IntoIterator<Item = &'a CardId>) -> bool {
        card_ids.into_iter().all(|id| {
            self.cards
                .get(id)
                .is_some_and(|progress| progress.level == RecallLevel::Mastered)
        })
    }

    /// The persisted schedule for a card, if one was ever saved.
    #[must_use]
    pub fn schedule_for(&self, card_id: CardId) -> Option<&ScheduleState> {
        self.cards.get(&card_id).and_then(|p| p.schedule.as_ref())
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
