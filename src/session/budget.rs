//! Per-participant vote budget.
//!
//! The budget is an independent counter. It gates the upvote control for one
//! session and is never reconciled against the votes actually on the board.

use crate::errors::AppError;
use crate::models::VoteDelta;

pub const DEFAULT_MAX_VOTES: u32 = 5;
pub const MAX_VOTES_LIMIT: u32 = 20;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VoteBudget {
    max_votes: u32,
    votes_remaining: i64,
}

impl Default for VoteBudget {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_VOTES)
    }
}

impl VoteBudget {
    pub fn new(max_votes: u32) -> Self {
        Self {
            max_votes,
            votes_remaining: i64::from(max_votes),
        }
    }

    pub fn max_votes(&self) -> u32 {
        self.max_votes
    }

    pub fn votes_remaining(&self) -> i64 {
        self.votes_remaining
    }

    pub fn can_upvote(&self) -> bool {
        self.votes_remaining > 0
    }

    pub fn cast_vote(&mut self, delta: VoteDelta) {
        self.votes_remaining -= delta.value();
    }

    /// Set a new limit and refill the budget, even if votes were already cast.
    ///
    /// Returns `false` without touching the budget when the limit is unchanged.
    pub fn set_max_votes(&mut self, max_votes: u32) -> Result<bool, AppError> {
        validate_max_votes(max_votes)?;
        if max_votes == self.max_votes {
            return Ok(false);
        }
        self.max_votes = max_votes;
        self.reset();
        Ok(true)
    }

    pub fn reset(&mut self) {
        self.votes_remaining = i64::from(self.max_votes);
    }
}

pub fn validate_max_votes(max_votes: u32) -> Result<(), AppError> {
    if (1..=MAX_VOTES_LIMIT).contains(&max_votes) {
        Ok(())
    } else {
        Err(AppError::Validation(format!(
            "Max votes must be between 1 and {}, got {}",
            MAX_VOTES_LIMIT, max_votes
        )))
    }
}
