//! Participant sessions.
//!
//! A [`SessionContext`] is everything one participant's browser holds: a
//! possibly stale copy of the board, a private vote budget, the merge
//! selection and the sort toggle. It is passed explicitly to every engine
//! operation.

pub mod budget;

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::{Mutex, RwLock};
use uuid::Uuid;

pub use budget::VoteBudget;

use crate::errors::AppError;
use crate::models::{BoardId, BoardState, CardId};
use crate::store::BoardStore;

pub type SessionId = Uuid;

/// One participant's view of one board.
#[derive(Debug, Clone)]
pub struct SessionContext {
    pub id: SessionId,
    pub board: BoardState,
    pub budget: VoteBudget,
    pub selected: HashSet<CardId>,
    pub sort_by_votes: bool,
    last_seen: Instant,
    /// Bumped on every board write made through this session.
    generation: u64,
}

impl SessionContext {
    /// Build a session around an already loaded board.
    pub fn new(board: BoardState, max_votes: u32) -> Self {
        Self {
            id: Uuid::new_v4(),
            board,
            budget: VoteBudget::new(max_votes),
            selected: HashSet::new(),
            sort_by_votes: false,
            last_seen: Instant::now(),
            generation: 0,
        }
    }

    /// Join a board, loading its current state from the store.
    pub async fn open(
        store: &dyn BoardStore,
        board_id: &BoardId,
        max_votes: u32,
    ) -> Result<Self, AppError> {
        let board = BoardState::load(store, board_id).await?;
        Ok(Self::new(board, max_votes))
    }

    pub fn board_id(&self) -> &BoardId {
        &self.board.board_id
    }

    /// Reload the board from the store. On failure the previous snapshot stays.
    pub async fn refresh(&mut self, store: &dyn BoardStore) -> Result<(), AppError> {
        let board = BoardState::load(store, &self.board.board_id).await?;
        self.apply_snapshot(board);
        Ok(())
    }

    /// Replace the cached board, dropping selections for cards that vanished.
    pub fn apply_snapshot(&mut self, board: BoardState) {
        self.selected
            .retain(|id| board.cards.iter().any(|c| c.id == *id));
        self.board = board;
    }

    /// Apply a snapshot that was loaded without holding this session's lock.
    ///
    /// Returns `false` and keeps the current board if the session wrote to the
    /// store after `seen_generation` was read, since the snapshot may predate
    /// that write.
    pub fn apply_snapshot_since(&mut self, board: BoardState, seen_generation: u64) -> bool {
        if self.generation != seen_generation {
            return false;
        }
        self.apply_snapshot(board);
        true
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub(crate) fn record_write(&mut self) {
        self.generation += 1;
    }

    pub fn touch(&mut self) {
        self.last_seen = Instant::now();
    }

    pub fn idle_for(&self) -> Duration {
        self.last_seen.elapsed()
    }
}

pub type SessionHandle = Arc<Mutex<SessionContext>>;

/// All live sessions of this server.
#[derive(Debug, Default)]
pub struct SessionRegistry {
    sessions: RwLock<HashMap<SessionId, SessionHandle>>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert(&self, session: SessionContext) -> SessionHandle {
        let id = session.id;
        let handle = Arc::new(Mutex::new(session));
        self.sessions.write().await.insert(id, handle.clone());
        handle
    }

    pub async fn get(&self, id: SessionId) -> Result<SessionHandle, AppError> {
        self.sessions
            .read()
            .await
            .get(&id)
            .cloned()
            .ok_or_else(|| AppError::SessionNotFound(format!("Session {} not found", id)))
    }

    pub async fn remove(&self, id: SessionId) -> Result<(), AppError> {
        self.sessions
            .write()
            .await
            .remove(&id)
            .map(|_| ())
            .ok_or_else(|| AppError::SessionNotFound(format!("Session {} not found", id)))
    }

    pub async fn handles(&self) -> Vec<SessionHandle> {
        self.sessions.read().await.values().cloned().collect()
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    /// Drop sessions idle for longer than `ttl`. Sessions busy with an
    /// operation are kept.
    pub async fn evict_idle(&self, ttl: Duration) -> usize {
        let mut sessions = self.sessions.write().await;
        let before = sessions.len();
        sessions.retain(|_, handle| match handle.try_lock() {
            Ok(session) => session.idle_for() <= ttl,
            Err(_) => true,
        });
        before - sessions.len()
    }
}
