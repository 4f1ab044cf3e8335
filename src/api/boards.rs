//! Board API endpoints: identity, raw snapshots and joining.

use axum::extract::{Path, State};
use serde::Serialize;

use super::{success, ApiResult};
use crate::models::{BoardId, BoardState};
use crate::session::SessionContext;
use crate::view::SessionView;
use crate::AppState;

/// A freshly generated board identity.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewBoard {
    pub board_id: BoardId,
    pub share_suffix: String,
}

/// POST /api/boards - Generate a new board ID.
///
/// Nothing is written; the board comes into existence with its first topic.
pub async fn create_board() -> ApiResult<NewBoard> {
    let board_id = BoardId::generate();
    tracing::info!("Generated board {}", board_id);
    success(NewBoard {
        share_suffix: board_id.share_suffix(),
        board_id,
    })
}

/// GET /api/boards/:board_id - Current topic and cards, straight from the store.
pub async fn get_board(
    State(state): State<AppState>,
    Path(board_id): Path<String>,
) -> ApiResult<BoardState> {
    let board_id = BoardId::parse(&board_id)?;
    let board = BoardState::load(state.store.as_ref(), &board_id).await?;
    success(board)
}

/// POST /api/boards/:board_id/sessions - Join a board as a new participant.
pub async fn join_board(
    State(state): State<AppState>,
    Path(board_id): Path<String>,
) -> ApiResult<SessionView> {
    let board_id = BoardId::parse(&board_id)?;
    let session = SessionContext::open(
        state.store.as_ref(),
        &board_id,
        state.config.default_max_votes,
    )
    .await?;
    let view = SessionView::build(&session, &state.config.stage_labels);
    state.sessions.insert(session).await;
    tracing::info!(board_id = %board_id, session_id = %view.session_id, "Participant joined");
    success(view)
}
