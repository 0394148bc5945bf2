use std::collections::HashMap;

use storage::repository::{KeyValueStore, ProgressStore};
use storage::sqlite::SqliteStore;
use vocab_core::model::{CardId, DeckId, RecallLevel, SessionOutcome, StudyMethod};
use vocab_core::scheduler::ScheduleState;
use vocab_core::time::fixed_now;

fn outcome(level: RecallLevel, session_attempts: u32) -> SessionOutcome {
    SessionOutcome {
        level,
        session_attempts,
        schedule: Some(ScheduleState::fresh(fixed_now())),
    }
}

#[tokio::test]
async fn sqlite_roundtrips_raw_entries() {
    let store = SqliteStore::connect("sqlite:file:memdb_kv_roundtrip?mode=memory&cache=shared")
        .await
        .expect("connect");
    store.migrate().await.expect("migrate");

    assert_eq!(store.get("progress:spaced:1").await.unwrap(), None);

    store.set("progress:spaced:1", "{}").await.unwrap();
    store.set("progress:spaced:1", r#"{"version":3}"#).await.unwrap();

    assert_eq!(
        store.get("progress:spaced:1").await.unwrap().as_deref(),
        Some(r#"{"version":3}"#)
    );
}

#[tokio::test]
async fn sqlite_progress_merges_accumulate() {
    let progress_store =
        ProgressStore::sqlite("sqlite:file:memdb_progress_merge?mode=memory&cache=shared")
            .await
            .expect("connect and migrate");

    let deck = DeckId::new(4);
    let card = CardId::new(11);

    let first: HashMap<_, _> = [(card, outcome(RecallLevel::Learning, 2))].into();
    progress_store
        .merge(deck, StudyMethod::Writing, &first, fixed_now())
        .await
        .unwrap();

    let second: HashMap<_, _> = [(card, outcome(RecallLevel::Mastered, 3))].into();
    progress_store
        .merge(deck, StudyMethod::Writing, &second, fixed_now())
        .await
        .unwrap();

    let loaded = progress_store
        .load(deck, StudyMethod::Writing)
        .await
        .unwrap();
    let record = &loaded.cards[&card];
    assert_eq!(record.repetitions, 5);
    assert_eq!(record.level, RecallLevel::Mastered);
    assert!(record.schedule.is_some());
    assert_eq!(loaded.version, 2);
}

#[tokio::test]
async fn sqlite_keeps_methods_separate() {
    let progress_store =
        ProgressStore::sqlite("sqlite:file:memdb_methods?mode=memory&cache=shared")
            .await
            .expect("connect and migrate");

    let deck = DeckId::new(4);
    let outcomes: HashMap<_, _> = [(CardId::new(1), outcome(RecallLevel::Mastered, 1))].into();

    progress_store
        .merge(deck, StudyMethod::Flashcard, &outcomes, fixed_now())
        .await
        .unwrap();

    let spaced = progress_store.load(deck, StudyMethod::Spaced).await.unwrap();
    assert!(spaced.cards.is_empty());
}
