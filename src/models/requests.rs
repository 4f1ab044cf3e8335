//! Request bodies accepted by the session endpoints.

use serde::Deserialize;

use super::{Stage, VoteDelta};

/// Request body for starting a new meeting topic.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SetTopicRequest {
    pub topic: String,
}

/// Request body for changing this participant's vote budget.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SetMaxVotesRequest {
    pub max_votes: u32,
}

/// Request body for toggling vote-sorted columns.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SetSortRequest {
    pub sort_by_votes: bool,
}

/// Request body for editing a card in place.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EditCardRequest {
    pub text: String,
}

/// Request body for moving a card to an adjacent stage.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MoveCardRequest {
    pub stage: Stage,
}

/// Request body for casting or withdrawing a vote.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VoteRequest {
    pub delta: VoteDelta,
}

/// Request body for the merge checkbox of a card.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SelectCardRequest {
    pub selected: bool,
}
