#![forbid(unsafe_code)]

pub mod deck_source;
pub mod error;
pub mod session_loop;
pub mod study_session;

pub use vocab_core::Clock;

pub use deck_source::{CardSource, DeckSourceConfig, HttpCardSource};
pub use error::{DeckSourceError, SessionError};
pub use session_loop::{SessionAnswerResult, SessionCompletion, SessionLoopService};
pub use study_session::{SessionAnswer, SessionProgress, StudySession};
