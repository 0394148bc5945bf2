use std::collections::HashMap;
use std::fmt;

use chrono::{DateTime, Duration, Utc};

use vocab_core::model::{
    AnswerLog, Card, CardId, DeckId, DeckProgress, RecallLevel, SessionOutcome, SessionSummary,
    StudyMethod,
};
use vocab_core::queue::StudyQueue;
use vocab_core::scheduler::{self, ScheduleState};

use crate::error::SessionError;

//
// ─── VIEWS ─────────────────────────────────────────────────────────────────────
//

/// Aggregated view of session progress, useful for UI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionProgress {
    pub total_cards: usize,
    pub answers_given: usize,
    pub remaining: usize,
    pub is_complete: bool,
}

/// What one answer produced: the log entry and the card's new schedule.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionAnswer {
    pub log: AnswerLog,
    pub schedule: ScheduleState,
}

//
// ─── STUDY SESSION ─────────────────────────────────────────────────────────────
//

/// One in-memory study session over a deck.
///
/// Owns the session queue and the per-card schedules; every answer runs the
/// scheduler, requeues the card, and records a log entry. Nothing here is
/// durable: abandoning the session discards all of it, and only an explicit
/// save persists progress.
pub struct StudySession {
    deck_id: DeckId,
    method: StudyMethod,
    cards: HashMap<CardId, Card>,
    card_ids: Vec<CardId>,
    queue: StudyQueue,
    schedules: HashMap<CardId, ScheduleState>,
    logs: Vec<AnswerLog>,
    started_at: DateTime<Utc>,
    completed_at: Option<DateTime<Utc>>,
    base_version: u64,
}

impl StudySession {
    /// Start a session over the given cards, in their given order.
    ///
    /// Schedules are seeded from `prior` progress where the card has been
    /// studied before, fresh otherwise. An empty deck yields a session that
    /// is complete immediately.
    #[must_use]
    pub fn new(
        deck_id: DeckId,
        method: StudyMethod,
        cards: Vec<Card>,
        prior: &DeckProgress,
        started_at: DateTime<Utc>,
    ) -> Self {
        let card_ids: Vec<CardId> = cards.iter().map(Card::id).collect();
        let schedules = card_ids
            .iter()
            .map(|&id| {
                let state = prior
                    .schedule_for(id)
                    .cloned()
                    .unwrap_or_else(|| ScheduleState::fresh(started_at));
                (id, state)
            })
            .collect();

        let queue = StudyQueue::new(card_ids.iter().copied());
        let completed_at = queue.is_complete().then_some(started_at);

        Self {
            deck_id,
            method,
            cards: cards.into_iter().map(|card| (card.id(), card)).collect(),
            card_ids,
            queue,
            schedules,
            logs: Vec::new(),
            started_at,
            completed_at,
            base_version: prior.version,
        }
    }

    #[must_use]
    pub fn deck_id(&self) -> DeckId {
        self.deck_id
    }

    #[must_use]
    pub fn method(&self) -> StudyMethod {
        self.method
    }

    #[must_use]
    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    #[must_use]
    pub fn completed_at(&self) -> Option<DateTime<Utc>> {
        self.completed_at
    }

    /// Version of the durable progress this session was seeded from.
    #[must_use]
    pub fn base_version(&self) -> u64 {
        self.base_version
    }

    /// IDs of every card that is part of this session, in deck order.
    #[must_use]
    pub fn card_ids(&self) -> &[CardId] {
        &self.card_ids
    }

    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.completed_at.is_some()
    }

    /// End the session now, keeping whatever levels stand.
    ///
    /// The queue drains on its own only once every card is mastered;
    /// finishing early is how a session ends with cards still at `learning`
    /// or `new`. Cards never answered are not part of the session's
    /// outcomes. Has no effect on an already completed session.
    pub fn finish(&mut self, now: DateTime<Utc>) {
        if self.completed_at.is_none() {
            self.completed_at = Some(now);
        }
    }

    /// The card to show next, or `None` once the queue is drained.
    #[must_use]
    pub fn current_card(&self) -> Option<&Card> {
        self.queue.current().and_then(|id| self.cards.get(&id))
    }

    /// The current schedule for a card in this session.
    #[must_use]
    pub fn schedule_for(&self, card_id: CardId) -> Option<&ScheduleState> {
        self.schedules.get(&card_id)
    }

    #[must_use]
    pub fn logs(&self) -> &[AnswerLog] {
        &self.logs
    }

    /// Returns a summary of the current session progress.
    #[must_use]
    pub fn progress(&self) -> SessionProgress {
        SessionProgress {
            total_cards: self.card_ids.len(),
            answers_given: self.logs.len(),
            remaining: self.queue.remaining(),
            is_complete: self.is_complete(),
        }
    }

    /// Wall-clock time spent so far, sampled on demand.
    #[must_use]
    pub fn elapsed(&self, now: DateTime<Utc>) -> Duration {
        self.completed_at.unwrap_or(now) - self.started_at
    }

    /// Grade the current card and advance the session.
    ///
    /// Runs the scheduler on the card's state, requeues the card according
    /// to the recall level, and records the answer. The queue decides when
    /// the session is over.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Completed` if the session is already finished;
    /// propagates scheduler and queue rejections with the session unchanged.
    pub fn answer_current(
        &mut self,
        level: RecallLevel,
        answered_at: DateTime<Utc>,
    ) -> Result<SessionAnswer, SessionError> {
        if self.is_complete() {
            return Err(SessionError::Completed);
        }
        let Some(card_id) = self.queue.current() else {
            return Err(SessionError::Completed);
        };

        let state = self
            .schedules
            .get(&card_id)
            .cloned()
            .unwrap_or_else(|| ScheduleState::fresh(answered_at));
        let next = scheduler::schedule(&state, level.quality(), answered_at)?;

        self.queue.record_answer(card_id, level, answered_at)?;
        self.schedules.insert(card_id, next.clone());

        let log = AnswerLog::new(card_id, level, answered_at);
        self.logs.push(log.clone());

        if self.queue.is_complete() {
            self.completed_at = Some(answered_at);
        }

        Ok(SessionAnswer {
            log,
            schedule: next,
        })
    }

    /// The session's deltas for the progress merge, one entry per card
    /// answered at least once.
    #[must_use]
    pub fn outcomes(&self) -> HashMap<CardId, SessionOutcome> {
        self.queue
            .attempts()
            .iter()
            .map(|(&card_id, attempts)| {
                (
                    card_id,
                    SessionOutcome {
                        level: attempts.level,
                        session_attempts: attempts.attempts,
                        schedule: self.schedules.get(&card_id).cloned(),
                    },
                )
            })
            .collect()
    }

    /// Build the summary statistics for a finished session.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::InProgress` when the session has not completed.
    pub fn build_summary(
        &self,
        deck_fully_mastered: bool,
    ) -> Result<SessionSummary, SessionError> {
        let completed_at = self.completed_at.ok_or(SessionError::InProgress)?;
        Ok(SessionSummary::from_logs(
            self.deck_id,
            self.started_at,
            completed_at,
            &self.logs,
            deck_fully_mastered,
        )?)
    }
}

impl fmt::Debug for StudySession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StudySession")
            .field("deck_id", &self.deck_id)
            .field("method", &self.method)
            .field("cards_len", &self.card_ids.len())
            .field("answers", &self.logs.len())
            .field("started_at", &self.started_at)
            .field("completed_at", &self.completed_at)
            .finish_non_exhaustive()
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;
    use vocab_core::time::fixed_now;

    fn build_card(id: u64) -> Card {
        Card::new(CardId::new(id), format!("word-{id}"), format!("meaning-{id}")).unwrap()
    }

    fn build_session(ids: &[u64]) -> StudySession {
        let cards = ids.iter().copied().map(build_card).collect();
        StudySession::new(
            DeckId::new(1),
            StudyMethod::Flashcard,
            cards,
            &DeckProgress::default(),
            fixed_now(),
        )
    }

    #[test]
    fn empty_deck_completes_immediately() {
        let session = build_session(&[]);
        assert!(session.is_complete());
        assert!(session.current_card().is_none());
        assert_eq!(session.completed_at(), Some(fixed_now()));

        let summary = session.build_summary(true).unwrap();
        assert_eq!(summary.total_answers(), 0);
    }

    #[test]
    fn answering_all_mastered_completes_in_one_pass() {
        let mut session = build_session(&[1, 2, 3]);

        for _ in 0..3 {
            session
                .answer_current(RecallLevel::Mastered, fixed_now())
                .unwrap();
        }

        assert!(session.is_complete());
        assert_eq!(session.logs().len(), 3);
        assert_eq!(session.progress().answers_given, 3);

        let err = session
            .answer_current(RecallLevel::Mastered, fixed_now())
            .unwrap_err();
        assert!(matches!(err, SessionError::Completed));
    }

    #[test]
    fn failed_card_cycles_back_until_mastered() {
        let mut session = build_session(&[1, 2]);

        // fail card 1; it moves behind card 2
        session.answer_current(RecallLevel::New, fixed_now()).unwrap();
        assert_eq!(session.current_card().unwrap().id(), CardId::new(2));

        session
            .answer_current(RecallLevel::Mastered, fixed_now())
            .unwrap();
        assert_eq!(session.current_card().unwrap().id(), CardId::new(1));

        session
            .answer_current(RecallLevel::Mastered, fixed_now())
            .unwrap();
        assert!(session.is_complete());
        assert_eq!(session.logs().len(), 3);
    }

    #[test]
    fn answer_updates_card_schedule() {
        let mut session = build_session(&[1]);
        let answer = session
            .answer_current(RecallLevel::Mastered, fixed_now())
            .unwrap();

        assert_eq!(answer.schedule.repetitions, 1);
        assert_eq!(answer.schedule.interval_days, 1);
        assert_eq!(
            session.schedule_for(CardId::new(1)).unwrap(),
            &answer.schedule
        );
    }

    #[test]
    fn schedules_seed_from_prior_progress() {
        let card = build_card(1);
        let mut prior = DeckProgress::default();
        let outcomes: HashMap<_, _> = [(
            card.id(),
            SessionOutcome {
                level: RecallLevel::Learning,
                session_attempts: 2,
                schedule: Some(ScheduleState {
                    interval_days: 6,
                    repetitions: 2,
                    ease_factor: 2.5,
                    next_review_at: fixed_now(),
                }),
            },
        )]
        .into();
        prior.merge_session(&outcomes, fixed_now());

        let mut session = StudySession::new(
            DeckId::new(1),
            StudyMethod::Spaced,
            vec![card],
            &prior,
            fixed_now(),
        );
        assert_eq!(session.base_version(), 1);

        // third consecutive success: round(6 * 2.5) = 15
        let answer = session
            .answer_current(RecallLevel::Mastered, fixed_now())
            .unwrap();
        assert_eq!(answer.schedule.interval_days, 15);
        assert_eq!(answer.schedule.repetitions, 3);
    }

    #[test]
    fn outcomes_report_session_attempts_and_final_level() {
        let mut session = build_session(&[1, 2]);

        session.answer_current(RecallLevel::New, fixed_now()).unwrap();
        session
            .answer_current(RecallLevel::Mastered, fixed_now())
            .unwrap();
        session
            .answer_current(RecallLevel::Mastered, fixed_now())
            .unwrap();

        let outcomes = session.outcomes();
        let first = &outcomes[&CardId::new(1)];
        assert_eq!(first.session_attempts, 2);
        assert_eq!(first.level, RecallLevel::Mastered);
        assert!(first.schedule.is_some());
        assert_eq!(outcomes[&CardId::new(2)].session_attempts, 1);
    }

    #[test]
    fn summary_requires_completion() {
        let mut session = build_session(&[1, 2]);
        let err = session.build_summary(false).unwrap_err();
        assert!(matches!(err, SessionError::InProgress));

        // learning with one other card remaining reinserts at the front,
        // so card 1 is graded twice before card 2 comes up
        session
            .answer_current(RecallLevel::Learning, fixed_now())
            .unwrap();
        session
            .answer_current(RecallLevel::Mastered, fixed_now())
            .unwrap();
        session
            .answer_current(RecallLevel::Mastered, fixed_now())
            .unwrap();

        let summary = session.build_summary(true).unwrap();
        assert_eq!(summary.cards_studied(), 2);
        assert_eq!(summary.total_answers(), 3);
        assert!(summary.deck_fully_mastered());
    }

    #[test]
    fn finishing_early_keeps_recorded_levels() {
        let mut session = build_session(&[1, 2]);

        session.answer_current(RecallLevel::New, fixed_now()).unwrap();
        session
            .answer_current(RecallLevel::Mastered, fixed_now())
            .unwrap();
        assert!(!session.is_complete());

        let ended_at = fixed_now() + Duration::minutes(2);
        session.finish(ended_at);
        assert!(session.is_complete());
        assert_eq!(session.completed_at(), Some(ended_at));

        let err = session
            .answer_current(RecallLevel::Mastered, fixed_now())
            .unwrap_err();
        assert!(matches!(err, SessionError::Completed));

        let outcomes = session.outcomes();
        assert_eq!(outcomes[&CardId::new(1)].level, RecallLevel::New);
        assert_eq!(outcomes[&CardId::new(2)].level, RecallLevel::Mastered);
    }

    #[test]
    fn elapsed_uses_wall_clock_delta() {
        let mut session = build_session(&[1]);
        let later = fixed_now() + Duration::minutes(3);
        assert_eq!(session.elapsed(later), Duration::minutes(3));

        session
            .answer_current(RecallLevel::Mastered, later)
            .unwrap();
        // once complete, elapsed is pinned to the completion time
        assert_eq!(
            session.elapsed(later + Duration::minutes(10)),
            Duration::minutes(3)
        );
    }
}
