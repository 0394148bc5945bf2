use thiserror::Error;

use crate::model::ids::CardId;

//
// ─── CARD ──────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CardError {
    #[error("card word must not be blank")]
    BlankWord,

    #[error("card meaning must not be blank")]
    BlankMeaning,
}

/// A single vocabulary item being studied.
///
/// Display-only payload: the scheduler and the study queue treat everything
/// except `id` as opaque. Cards are fetched read-only from the card source at
/// session start and never mutated by the engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Card {
    id: CardId,
    word: String,
    meaning: String,
    example: Option<String>,
    phonetic: Option<String>,
    part_of_speech: Option<String>,
}

impl Card {
    /// Create a card from the required word/meaning pair.
    ///
    /// # Errors
    ///
    /// Returns `CardError::BlankWord` / `CardError::BlankMeaning` when either
    /// field is empty or whitespace-only.
    pub fn new(
        id: CardId,
        word: impl Into<String>,
        meaning: impl Into<String>,
    ) -> Result<Self, CardError> {
        let word = word.into();
        let meaning = meaning.into();

        if word.trim().is_empty() {
            return Err(CardError::BlankWord);
        }
        if meaning.trim().is_empty() {
            return Err(CardError::BlankMeaning);
        }

        Ok(Self {
            id,
            word,
            meaning,
            example: None,
            phonetic: None,
            part_of_speech: None,
        })
    }

    #[must_use]
    pub fn with_example(mut self, example: impl Into<String>) -> Self {
        self.example = Some(example.into());
        self
    }

    #[must_use]
    pub fn with_phonetic(mut self, phonetic: impl Into<String>) -> Self {
        self.phonetic = Some(phonetic.into());
        self
    }

    #[must_use]
    pub fn with_part_of_speech(mut self, part_of_speech: impl Into<String>) -> Self {
        self.part_of_speech = Some(part_of_speech.into());
        self
    }

    #[must_use]
    pub fn id(&self) -> CardId {
        self.id
    }

    #[must_use]
    pub fn word(&self) -> &str {
        &self.word
    }

    #[must_use]
    pub fn meaning(&self) -> &str {
        &self.meaning
    }

    #[must_use]
    pub fn example(&self) -> Option<&str> {
        self.example.as_deref()
    }

    #[must_use]
    pub fn phonetic(&self) -> Option<&str> {
        self.phonetic.as_deref()
    }

    #[must_use]
    pub fn part_of_speech(&self) -> Option<&str> {
        self.part_of_speech.as_deref()
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn card_fails_if_word_blank() {
        let err = Card::new(CardId::new(1), "   ", "greeting").unwrap_err();
        assert_eq!(err, CardError::BlankWord);
    }

    #[test]
    fn card_fails_if_meaning_blank() {
        let err = Card::new(CardId::new(1), "hola", "").unwrap_err();
        assert_eq!(err, CardError::BlankMeaning);
    }

    #[test]
    fn valid_card_keeps_optional_fields() {
        let card = Card::new(CardId::new(7), "hola", "hello")
            .unwrap()
            .with_example("¡Hola, mundo!")
            .with_phonetic("ˈola")
            .with_part_of_speech("interjection");

        assert_eq!(card.id(), CardId::new(7));
        assert_eq!(card.word(), "hola");
        assert_eq!(card.meaning(), "hello");
        assert_eq!(card.example(), Some("¡Hola, mundo!"));
        assert_eq!(card.phonetic(), Some("ˈola"));
        assert_eq!(card.part_of_speech(), Some("interjection"));
    }
}
