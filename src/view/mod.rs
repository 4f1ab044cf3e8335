//! Three-column board view.
//!
//! Derived from a session on every response; never mutates the board.

use serde::Serialize;

use crate::models::{Card, CardId, Stage, StageLabels};
use crate::session::{SessionContext, SessionId};

/// Split cards into the three stage columns.
///
/// Each column keeps board order, or is stable-sorted by votes descending when
/// `sort_by_votes` is set. Entries carry the card's position on the board.
pub fn partition(cards: &[Card], sort_by_votes: bool) -> [Vec<(usize, &Card)>; 3] {
    let mut columns: [Vec<(usize, &Card)>; 3] = Default::default();
    for (pos, card) in cards.iter().enumerate() {
        columns[card.status.index()].push((pos, card));
    }
    if sort_by_votes {
        for column in &mut columns {
            // sort_by is stable, so equal votes keep board order
            column.sort_by(|(_, a), (_, b)| b.votes.cmp(&a.votes));
        }
    }
    columns
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CardView {
    pub id: CardId,
    pub position: usize,
    pub text: String,
    pub votes: u32,
    pub status: Stage,
    pub selected: bool,
    pub can_move_back: bool,
    pub can_move_forward: bool,
    pub can_upvote: bool,
    pub can_downvote: bool,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ColumnView {
    pub stage: Stage,
    pub label: String,
    pub cards: Vec<CardView>,
}

/// Everything a participant's page needs to render the board.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionView {
    pub session_id: SessionId,
    pub board_id: String,
    pub share_suffix: String,
    pub topic: String,
    pub max_votes: u32,
    pub votes_remaining: i64,
    pub sort_by_votes: bool,
    pub can_add_card: bool,
    pub show_merge: bool,
    pub columns: Vec<ColumnView>,
}

impl SessionView {
    pub fn build(session: &SessionContext, labels: &StageLabels) -> Self {
        let can_upvote = session.budget.can_upvote();
        let columns = partition(&session.board.cards, session.sort_by_votes)
            .into_iter()
            .zip(Stage::ALL)
            .map(|(cards, stage)| ColumnView {
                stage,
                label: labels.label(stage).to_string(),
                cards: cards
                    .into_iter()
                    .map(|(position, card)| CardView {
                        id: card.id,
                        position,
                        text: card.text.clone(),
                        votes: card.votes,
                        status: card.status,
                        selected: session.selected.contains(&card.id),
                        can_move_back: stage.previous().is_some(),
                        can_move_forward: stage.next().is_some(),
                        can_upvote,
                        can_downvote: card.votes > 0,
                    })
                    .collect(),
            })
            .collect();

        Self {
            session_id: session.id,
            board_id: session.board_id().to_string(),
            share_suffix: session.board_id().share_suffix(),
            topic: session.board.topic.clone(),
            max_votes: session.budget.max_votes(),
            votes_remaining: session.budget.votes_remaining(),
            sort_by_votes: session.sort_by_votes,
            can_add_card: session.board.has_topic(),
            show_merge: !session.selected.is_empty(),
            columns,
        }
    }
}
