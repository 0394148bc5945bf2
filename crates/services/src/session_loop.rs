use std::sync::Arc;

use rand::rng;
use rand::seq::SliceRandom;
use tracing::{debug, info};

use storage::repository::ProgressStore;
use vocab_core::model::{DeckId, DeckProgress, RecallLevel, SessionSummary, StudyMethod};
use vocab_core::time::Clock;

use crate::deck_source::CardSource;
use crate::error::SessionError;
use crate::study_session::{SessionAnswer, StudySession};

/// Result of answering a single card in a session.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionAnswerResult {
    pub answer: SessionAnswer,
    pub is_complete: bool,
}

/// Result of saving a finished session: the summary statistics and the
/// merged durable progress.
///
/// `summary.deck_fully_mastered()` distinguishes the two completion
/// outcomes the caller presents ("fully mastered" vs. "done, keep going").
#[derive(Debug, Clone, PartialEq)]
pub struct SessionCompletion {
    pub summary: SessionSummary,
    pub progress: DeckProgress,
}

/// Orchestrates session start, answering, and progress persistence.
#[derive(Clone)]
pub struct SessionLoopService {
    clock: Clock,
    source: Arc<dyn CardSource>,
    progress: Arc<ProgressStore>,
    shuffle: bool,
}

impl SessionLoopService {
    #[must_use]
    pub fn new(clock: Clock, source: Arc<dyn CardSource>, progress: Arc<ProgressStore>) -> Self {
        Self {
            clock,
            source,
            progress,
            shuffle: false,
        }
    }

    /// Enable or disable shuffling the deck before the session starts.
    #[must_use]
    pub fn with_shuffle(mut self, shuffle: bool) -> Self {
        self.shuffle = shuffle;
        self
    }

    /// Fetch the deck, load its durable progress, and start a session.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Source` when the deck cannot be fetched and
    /// `SessionError::Storage` when prior progress cannot be loaded.
    pub async fn start_session(
        &self,
        deck_id: DeckId,
        method: StudyMethod,
    ) -> Result<StudySession, SessionError> {
        let mut cards = self.source.fetch_deck(deck_id).await?;
        if self.shuffle {
            cards.as_mut_slice().shuffle(&mut rng());
        }

        let prior = self.progress.load(deck_id, method).await?;
        let now = self.clock.now();
        debug!(%deck_id, method = method.as_str(), cards = cards.len(), "starting session");

        Ok(StudySession::new(deck_id, method, cards, &prior, now))
    }

    /// Grade the current card using the service clock.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Completed` if the session is already finished;
    /// propagates scheduler rejections.
    pub fn answer_current(
        &self,
        session: &mut StudySession,
        level: RecallLevel,
    ) -> Result<SessionAnswerResult, SessionError> {
        let answer = session.answer_current(level, self.clock.now())?;
        Ok(SessionAnswerResult {
            answer,
            is_complete: session.is_complete(),
        })
    }

    /// End the session now, using the service clock.
    ///
    /// Needed to stop studying before every card is mastered; the next
    /// [`SessionLoopService::save_progress`] call persists whatever levels
    /// stand.
    pub fn finish_session(&self, session: &mut StudySession) {
        session.finish(self.clock.now());
    }

    /// Merge a finished session's outcomes into durable storage and build
    /// the completion report.
    ///
    /// Last-writer-wins at deck granularity: a concurrent session's merge is
    /// silently replaced. Use [`SessionLoopService::save_progress_checked`]
    /// to detect that instead. On any error the session is untouched, so the
    /// save can be retried.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::InProgress` when the session has not finished,
    /// and `SessionError::Storage` when the merge cannot be persisted.
    pub async fn save_progress(
        &self,
        session: &StudySession,
    ) -> Result<SessionCompletion, SessionError> {
        self.save_inner(session, false).await
    }

    /// Like [`SessionLoopService::save_progress`], but fails with
    /// `StorageError::ConcurrentOverwrite` when another session merged this
    /// deck since the session started.
    ///
    /// # Errors
    ///
    /// As [`SessionLoopService::save_progress`], plus the version conflict.
    pub async fn save_progress_checked(
        &self,
        session: &StudySession,
    ) -> Result<SessionCompletion, SessionError> {
        self.save_inner(session, true).await
    }

    async fn save_inner(
        &self,
        session: &StudySession,
        checked: bool,
    ) -> Result<SessionCompletion, SessionError> {
        if !session.is_complete() {
            return Err(SessionError::InProgress);
        }

        let outcomes = session.outcomes();
        let now = self.clock.now();

        let merged = if checked {
            self.progress
                .merge_checked(
                    session.deck_id(),
                    session.method(),
                    session.base_version(),
                    &outcomes,
                    now,
                )
                .await?
        } else {
            self.progress
                .merge(session.deck_id(), session.method(), &outcomes, now)
                .await?
        };

        let deck_fully_mastered = merged.is_fully_mastered(session.card_ids().iter());
        let summary = session.build_summary(deck_fully_mastered)?;

        info!(
            deck_id = %session.deck_id(),
            method = session.method().as_str(),
            cards = summary.cards_studied(),
            mastered = deck_fully_mastered,
            "session progress saved"
        );

        Ok(SessionCompletion {
            summary,
            progress: merged,
        })
    }
}
