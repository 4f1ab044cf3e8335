//! Board store abstraction.
//!
//! The store is the source of truth for every board. Card collections are
//! never patched: callers always read the whole list and write it back whole.

#[cfg(test)]
mod memory;

#[cfg(test)]
pub use memory::MemoryStore;

use async_trait::async_trait;

use crate::errors::AppError;
use crate::models::{BoardId, Card};

/// Document-style persistence keyed by board ID.
///
/// Every method fails with [`AppError::StoreUnavailable`] when the backend
/// cannot be reached.
#[async_trait]
pub trait BoardStore: Send + Sync {
    /// Persisted topic, or an empty string when the board has none.
    async fn load_topic(&self, board_id: &BoardId) -> Result<String, AppError>;

    /// Upsert the topic without touching any other board field.
    async fn save_topic(&self, board_id: &BoardId, topic: &str) -> Result<(), AppError>;

    /// Cards ordered by their persisted position; empty for unknown boards.
    async fn load_cards(&self, board_id: &BoardId) -> Result<Vec<Card>, AppError>;

    /// Delete every card of the board, then write `cards` keyed by position.
    async fn replace_cards(&self, board_id: &BoardId, cards: &[Card]) -> Result<(), AppError>;

    /// Save a new topic and clear the card collection.
    async fn start_topic(&self, board_id: &BoardId, topic: &str) -> Result<(), AppError> {
        self.save_topic(board_id, topic).await?;
        self.replace_cards(board_id, &[]).await
    }
}
