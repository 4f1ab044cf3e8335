//! Board identity and the per-cycle board snapshot.

use serde::Serialize;

use super::{Card, CardId};
use crate::errors::AppError;
use crate::store::BoardStore;

const MAX_BOARD_ID_LEN: usize = 64;

/// Opaque, immutable board identifier carried in the `board_id` URL parameter.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct BoardId(String);

impl BoardId {
    /// Validate a board ID supplied by a participant.
    pub fn parse(raw: &str) -> Result<Self, AppError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(AppError::InvalidBoardId(
                "Board ID is required".to_string(),
            ));
        }
        if trimmed.len() > MAX_BOARD_ID_LEN {
            return Err(AppError::InvalidBoardId(format!(
                "Board ID must be at most {} characters",
                MAX_BOARD_ID_LEN
            )));
        }
        if !trimmed
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
        {
            return Err(AppError::InvalidBoardId(format!(
                "Board ID {:?} may only contain letters, digits, '-' and '_'",
                trimmed
            )));
        }
        Ok(Self(trimmed.to_string()))
    }

    /// Eight lowercase hex characters from a random UUID.
    pub fn generate() -> Self {
        let hex = uuid::Uuid::new_v4().simple().to_string();
        Self(hex[..8].to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Query suffix that lets another participant join this board.
    pub fn share_suffix(&self) -> String {
        format!("?board_id={}", self.0)
    }
}

impl std::fmt::Display for BoardId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// A snapshot of one board, rebuilt from the store on every interaction cycle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BoardState {
    pub board_id: BoardId,
    pub topic: String,
    pub cards: Vec<Card>,
}

impl BoardState {
    #[cfg(test)]
    pub fn empty(board_id: BoardId) -> Self {
        Self {
            board_id,
            topic: String::new(),
            cards: Vec::new(),
        }
    }

    /// Load the topic and ordered cards for a board.
    pub async fn load(store: &dyn BoardStore, board_id: &BoardId) -> Result<Self, AppError> {
        let topic = store.load_topic(board_id).await?;
        let cards = store.load_cards(board_id).await?;
        Ok(Self {
            board_id: board_id.clone(),
            topic,
            cards,
        })
    }

    pub fn has_topic(&self) -> bool {
        !self.topic.is_empty()
    }

    /// Current position of a card in the list.
    pub fn position(&self, card_id: CardId) -> Option<usize> {
        self.cards.iter().position(|c| c.id == card_id)
    }

    pub(crate) fn require_position(&self, card_id: CardId) -> Result<usize, AppError> {
        self.position(card_id).ok_or_else(|| {
            AppError::CardNotFound(format!(
                "Card {} not found on board {}",
                card_id, self.board_id
            ))
        })
    }
}
