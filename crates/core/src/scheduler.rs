use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SchedulerError {
    #[error("review quality must be between 1 and 4, got {0}")]
    InvalidQuality(u8),
}

//
// ─── SCHEDULE STATE ────────────────────────────────────────────────────────────
//

/// Lower bound for the ease factor; SM-2 never drops below this.
pub const MIN_EASE_FACTOR: f64 = 1.3;

/// Ease factor assigned to cards that have never been reviewed.
pub const INITIAL_EASE_FACTOR: f64 = 2.5;

/// Quality at or above this value counts as successful recall.
const SUCCESS_QUALITY: u8 = 3;

/// Per-card scheduling state consumed and produced by [`schedule`].
///
/// Persisted with the card's progress record so intervals keep growing
/// across sessions.
///
/// Invariants: `interval_days >= 1`, `ease_factor >= 1.3`, and
/// `repetitions` counts *consecutive* successful reviews (reset on failure).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduleState {
    pub interval_days: i64,
    pub repetitions: u32,
    pub ease_factor: f64,
    pub next_review_at: DateTime<Utc>,
}

impl ScheduleState {
    /// Default state for a card with no review history.
    #[must_use]
    pub fn fresh(now: DateTime<Utc>) -> Self {
        Self {
            interval_days: 1,
            repetitions: 0,
            ease_factor: INITIAL_EASE_FACTOR,
            next_review_at: now + Duration::days(1),
        }
    }

    /// True when the card is due at the given time.
    #[must_use]
    pub fn is_due(&self, now: DateTime<Utc>) -> bool {
        self.next_review_at <= now
    }
}

//
// ─── SCHEDULING ────────────────────────────────────────────────────────────────
//

/// Compute the next schedule for a card after one review (SM-2 variant).
///
/// Pure function: takes the card's current state and a quality signal in
/// 1..=4 and returns the new state. The success interval ladder is
/// 1 day, 6 days, then `round(interval * ease_factor)`; a failed review
/// (quality < 3) resets repetitions and the interval. The ease factor is
/// adjusted on every review, success or not, and floors at 1.3.
///
/// Note the interval for a repeat success uses the ease factor *before*
/// this review's adjustment.
///
/// # Errors
///
/// Returns `SchedulerError::InvalidQuality` when `quality` is outside 1..=4.
///
/// # Examples
///
/// ```
/// # use vocab_core::scheduler::{schedule, ScheduleState};
/// # use vocab_core::time::fixed_now;
/// let state = ScheduleState::fresh(fixed_now());
/// let next = schedule(&state, 4, fixed_now())?;
/// assert_eq!(next.repetitions, 1);
/// assert_eq!(next.interval_days, 1);
/// # Ok::<(), vocab_core::scheduler::SchedulerError>(())
/// ```
#[allow(clippy::cast_possible_truncation, clippy::cast_precision_loss)]
pub fn schedule(
    state: &ScheduleState,
    quality: u8,
    now: DateTime<Utc>,
) -> Result<ScheduleState, SchedulerError> {
    if !(1..=4).contains(&quality) {
        return Err(SchedulerError::InvalidQuality(quality));
    }

    let (interval_days, repetitions) = if quality >= SUCCESS_QUALITY {
        let interval = match state.repetitions {
            0 => 1,
            1 => 6,
            _ => ((state.interval_days as f64) * state.ease_factor).round() as i64,
        };
        (interval.max(1), state.repetitions + 1)
    } else {
        // Failed review: reset
        (1, 0)
    };

    // EF' = EF + (0.1 - (5 - q) * (0.08 + (5 - q) * 0.02)), floored at 1.3
    let q = f64::from(quality);
    let ease_delta = 0.1 - (5.0 - q) * (0.08 + (5.0 - q) * 0.02);
    let ease_factor = (state.ease_factor + ease_delta).max(MIN_EASE_FACTOR);

    Ok(ScheduleState {
        interval_days,
        repetitions,
        ease_factor,
        next_review_at: now + Duration::days(interval_days),
    })
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
