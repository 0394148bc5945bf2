use std::env;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::debug;

use vocab_core::model::{Card, CardId, DeckId};

use crate::error::DeckSourceError;

//
// ─── CONFIG ────────────────────────────────────────────────────────────────────
//

#[derive(Clone, Debug)]
pub struct DeckSourceConfig {
    pub base_url: String,
}

impl DeckSourceConfig {
    #[must_use]
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
        }
    }

    #[must_use]
    pub fn from_env() -> Option<Self> {
        let base_url = env::var("VOCAB_API_BASE_URL").ok()?;
        if base_url.trim().is_empty() {
            return None;
        }
        Some(Self { base_url })
    }
}

//
// ─── CARD SOURCE ───────────────────────────────────────────────────────────────
//

/// Where a session's cards come from.
///
/// The engine only consumes the result; implementations decide the transport.
#[async_trait]
pub trait CardSource: Send + Sync {
    /// Fetch all cards for a deck.
    ///
    /// # Errors
    ///
    /// Returns `DeckSourceError` when the deck cannot be fetched or decoded.
    async fn fetch_deck(&self, deck_id: DeckId) -> Result<Vec<Card>, DeckSourceError>;
}

/// Card source backed by the remote HTTP API.
///
/// Expects `GET {base}/decks/{id}/cards` to return a JSON array of card
/// objects with a stable integer `id`.
#[derive(Clone)]
pub struct HttpCardSource {
    client: Client,
    config: DeckSourceConfig,
}

impl HttpCardSource {
    #[must_use]
    pub fn new(config: DeckSourceConfig) -> Self {
        Self {
            client: Client::new(),
            config,
        }
    }
}

#[async_trait]
impl CardSource for HttpCardSource {
    async fn fetch_deck(&self, deck_id: DeckId) -> Result<Vec<Card>, DeckSourceError> {
        let url = format!(
            "{}/decks/{}/cards",
            self.config.base_url.trim_end_matches('/'),
            deck_id
        );
        debug!(%deck_id, %url, "fetching deck");

        let response = self.client.get(url).send().await?;
        if !response.status().is_success() {
            return Err(DeckSourceError::HttpStatus(response.status()));
        }

        let payload: Vec<CardDto> = response.json().await?;
        cards_from_dtos(payload)
    }
}

//
// ─── WIRE FORMAT ───────────────────────────────────────────────────────────────
//

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CardDto {
    id: u64,
    word: String,
    meaning: String,
    #[serde(default)]
    example: Option<String>,
    #[serde(default)]
    phonetic: Option<String>,
    #[serde(default)]
    part_of_speech: Option<String>,
}

fn cards_from_dtos(dtos: Vec<CardDto>) -> Result<Vec<Card>, DeckSourceError> {
    let mut cards = Vec::with_capacity(dtos.len());
    for dto in dtos {
        let mut card = Card::new(CardId::new(dto.id), dto.word, dto.meaning)?;
        if let Some(example) = dto.example {
            card = card.with_example(example);
        }
        if let Some(phonetic) = dto.phonetic {
            card = card.with_phonetic(phonetic);
        }
        if let Some(part_of_speech) = dto.part_of_speech {
            card = card.with_part_of_speech(part_of_speech);
        }
        cards.push(card);
    }
    Ok(cards)
}

/// Decode a JSON array of card objects into validated cards.
///
/// # Errors
///
/// Returns `DeckSourceError::Decode` for malformed JSON and
/// `DeckSourceError::Card` for payloads with blank word/meaning.
pub fn parse_cards(payload: &str) -> Result<Vec<Card>, DeckSourceError> {
    let dtos: Vec<CardDto> = serde_json::from_str(payload)?;
    cards_from_dtos(dtos)
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
