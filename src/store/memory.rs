//! In-memory board store used by unit tests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::BoardStore;
use crate::errors::AppError;
use crate::models::{BoardId, Card};

#[derive(Debug, Default, Clone)]
struct StoredBoard {
    topic: Option<String>,
    cards: Vec<Card>,
}

/// Hash map backed store with a switch to simulate an unreachable backend.
#[derive(Debug)]
pub struct MemoryStore {
    boards: RwLock<HashMap<BoardId, StoredBoard>>,
    available: AtomicBool,
    card_writes: AtomicUsize,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            boards: RwLock::new(HashMap::new()),
            available: AtomicBool::new(true),
            card_writes: AtomicUsize::new(0),
        }
    }

    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::SeqCst);
    }

    /// Number of successful `replace_cards` calls so far.
    pub fn card_writes(&self) -> usize {
        self.card_writes.load(Ordering::SeqCst)
    }

    fn check(&self) -> Result<(), AppError> {
        if self.available.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(AppError::StoreUnavailable(
                "memory store switched off".to_string(),
            ))
        }
    }
}

#[async_trait]
impl BoardStore for MemoryStore {
    async fn load_topic(&self, board_id: &BoardId) -> Result<String, AppError> {
        self.check()?;
        let boards = self.boards.read().await;
        Ok(boards
            .get(board_id)
            .and_then(|b| b.topic.clone())
            .unwrap_or_default())
    }

    async fn save_topic(&self, board_id: &BoardId, topic: &str) -> Result<(), AppError> {
        self.check()?;
        let mut boards = self.boards.write().await;
        boards.entry(board_id.clone()).or_default().topic = Some(topic.to_string());
        Ok(())
    }

    async fn load_cards(&self, board_id: &BoardId) -> Result<Vec<Card>, AppError> {
        self.check()?;
        let boards = self.boards.read().await;
        Ok(boards
            .get(board_id)
            .map(|b| b.cards.clone())
            .unwrap_or_default())
    }

    async fn replace_cards(&self, board_id: &BoardId, cards: &[Card]) -> Result<(), AppError> {
        self.check()?;
        let mut boards = self.boards.write().await;
        boards.entry(board_id.clone()).or_default().cards = cards.to_vec();
        self.card_writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
