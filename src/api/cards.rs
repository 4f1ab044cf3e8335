//! Card API endpoints.

use axum::{
    extract::{Path, State},
    Json,
};

use super::{parse_uuid, session_handle, success, ApiResult, OperationResponse};
use crate::engine;
use crate::models::{EditCardRequest, MoveCardRequest, SelectCardRequest, VoteRequest};
use crate::AppState;

/// POST /api/sessions/:id/cards - Add an empty card.
pub async fn add_card(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> ApiResult<OperationResponse> {
    let handle = session_handle(&state, &session_id).await?;
    let mut session = handle.lock().await;
    session.touch();
    let outcome = engine::add_card(&mut session, state.store.as_ref()).await?;
    success(OperationResponse::new(outcome, &session, &state))
}

/// PUT /api/sessions/:id/cards/:card_id - Edit a card's text.
pub async fn edit_card(
    State(state): State<AppState>,
    Path((session_id, card_id)): Path<(String, String)>,
    Json(request): Json<EditCardRequest>,
) -> ApiResult<OperationResponse> {
    let card_id = parse_uuid(&card_id, "card id")?;
    let handle = session_handle(&state, &session_id).await?;
    let mut session = handle.lock().await;
    session.touch();
    let outcome =
        engine::edit_card(&mut session, state.store.as_ref(), card_id, request.text).await?;
    success(OperationResponse::new(outcome, &session, &state))
}

/// DELETE /api/sessions/:id/cards/:card_id - Delete a card.
pub async fn delete_card(
    State(state): State<AppState>,
    Path((session_id, card_id)): Path<(String, String)>,
) -> ApiResult<OperationResponse> {
    let card_id = parse_uuid(&card_id, "card id")?;
    let handle = session_handle(&state, &session_id).await?;
    let mut session = handle.lock().await;
    session.touch();
    let outcome = engine::delete_card(&mut session, state.store.as_ref(), card_id).await?;
    success(OperationResponse::new(outcome, &session, &state))
}

/// POST /api/sessions/:id/cards/:card_id/move - Move a card to an adjacent stage.
pub async fn move_card(
    State(state): State<AppState>,
    Path((session_id, card_id)): Path<(String, String)>,
    Json(request): Json<MoveCardRequest>,
) -> ApiResult<OperationResponse> {
    let card_id = parse_uuid(&card_id, "card id")?;
    let handle = session_handle(&state, &session_id).await?;
    let mut session = handle.lock().await;
    session.touch();
    let outcome =
        engine::move_card(&mut session, state.store.as_ref(), card_id, request.stage).await?;
    success(OperationResponse::new(outcome, &session, &state))
}

/// POST /api/sessions/:id/cards/:card_id/vote - Cast or withdraw a vote.
pub async fn vote_card(
    State(state): State<AppState>,
    Path((session_id, card_id)): Path<(String, String)>,
    Json(request): Json<VoteRequest>,
) -> ApiResult<OperationResponse> {
    let card_id = parse_uuid(&card_id, "card id")?;
    let handle = session_handle(&state, &session_id).await?;
    let mut session = handle.lock().await;
    session.touch();
    let outcome = engine::vote(&mut session, state.store.as_ref(), card_id, request.delta).await?;
    success(OperationResponse::new(outcome, &session, &state))
}

/// PUT /api/sessions/:id/cards/:card_id/selection - Tick or untick for merging.
pub async fn select_card(
    State(state): State<AppState>,
    Path((session_id, card_id)): Path<(String, String)>,
    Json(request): Json<SelectCardRequest>,
) -> ApiResult<OperationResponse> {
    let card_id = parse_uuid(&card_id, "card id")?;
    let handle = session_handle(&state, &session_id).await?;
    let mut session = handle.lock().await;
    session.touch();
    let outcome = engine::set_selected(&mut session, card_id, request.selected)?;
    success(OperationResponse::new(outcome, &session, &state))
}
