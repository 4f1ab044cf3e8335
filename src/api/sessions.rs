//! Session API endpoints: the interaction cycle and board-level settings.

use axum::{
    extract::{Path, State},
    Json,
};

use super::{parse_uuid, session_handle, success, ApiResult, OperationResponse};
use crate::engine;
use crate::models::{SetMaxVotesRequest, SetSortRequest, SetTopicRequest};
use crate::view::SessionView;
use crate::AppState;

/// GET /api/sessions/:id - Reload the board from the store and render it.
pub async fn get_session(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> ApiResult<SessionView> {
    let handle = session_handle(&state, &session_id).await?;
    let mut session = handle.lock().await;
    session.touch();
    session.refresh(state.store.as_ref()).await?;
    success(SessionView::build(&session, &state.config.stage_labels))
}

/// DELETE /api/sessions/:id - Leave the board.
pub async fn leave_session(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> ApiResult<()> {
    let id = parse_uuid(&session_id, "session id")?;
    state.sessions.remove(id).await?;
    tracing::info!(session_id = %id, "Participant left");
    success(())
}

/// PUT /api/sessions/:id/topic - Start a new meeting topic.
pub async fn set_topic(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
    Json(request): Json<SetTopicRequest>,
) -> ApiResult<OperationResponse> {
    let handle = session_handle(&state, &session_id).await?;
    let mut session = handle.lock().await;
    session.touch();
    let outcome = engine::set_topic(&mut session, state.store.as_ref(), request.topic).await?;
    success(OperationResponse::new(outcome, &session, &state))
}

/// PUT /api/sessions/:id/max-votes - Change this participant's vote budget.
pub async fn set_max_votes(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
    Json(request): Json<SetMaxVotesRequest>,
) -> ApiResult<OperationResponse> {
    let handle = session_handle(&state, &session_id).await?;
    let mut session = handle.lock().await;
    session.touch();
    let outcome = engine::set_max_votes(&mut session, request.max_votes)?;
    success(OperationResponse::new(outcome, &session, &state))
}

/// PUT /api/sessions/:id/sort - Toggle vote-sorted columns.
pub async fn set_sort(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
    Json(request): Json<SetSortRequest>,
) -> ApiResult<OperationResponse> {
    let handle = session_handle(&state, &session_id).await?;
    let mut session = handle.lock().await;
    session.touch();
    let outcome = engine::set_sort_by_votes(&mut session, request.sort_by_votes);
    success(OperationResponse::new(outcome, &session, &state))
}

/// POST /api/sessions/:id/merge - Merge the selected cards.
pub async fn merge_selected(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> ApiResult<OperationResponse> {
    let handle = session_handle(&state, &session_id).await?;
    let mut session = handle.lock().await;
    session.touch();
    let outcome = engine::merge_selected(&mut session, state.store.as_ref()).await?;
    success(OperationResponse::new(outcome, &session, &state))
}
