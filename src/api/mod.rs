//! REST API module.
//!
//! Contains all API routes and handlers for the board client.

mod boards;
mod cards;
mod sessions;

pub use boards::*;
pub use cards::*;
pub use sessions::*;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use uuid::Uuid;

use crate::engine::Outcome;
use crate::errors::AppError;
use crate::session::{SessionContext, SessionHandle};
use crate::view::SessionView;
use crate::AppState;

/// Success response envelope.
#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub success: bool,
    pub data: T,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn new(data: T) -> Self {
        Self {
            success: true,
            data,
        }
    }
}

impl<T: Serialize> IntoResponse for ApiResponse<T> {
    fn into_response(self) -> Response {
        (StatusCode::OK, Json(self)).into_response()
    }
}

/// Response type that can be either success or error.
pub type ApiResult<T> = Result<ApiResponse<T>, AppError>;

/// Create a successful API response.
pub fn success<T: Serialize>(data: T) -> ApiResult<T> {
    Ok(ApiResponse::new(data))
}

/// Payload returned by every session operation.
#[derive(Debug, Serialize)]
pub struct OperationResponse {
    pub outcome: Outcome,
    pub session: SessionView,
}

impl OperationResponse {
    pub fn new(outcome: Outcome, session: &SessionContext, state: &AppState) -> Self {
        Self {
            outcome,
            session: SessionView::build(session, &state.config.stage_labels),
        }
    }
}

fn parse_uuid(raw: &str, what: &str) -> Result<Uuid, AppError> {
    Uuid::parse_str(raw).map_err(|_| AppError::BadRequest(format!("Malformed {} {:?}", what, raw)))
}

/// Resolve a session from its path segment.
async fn session_handle(state: &AppState, raw_id: &str) -> Result<SessionHandle, AppError> {
    let id = parse_uuid(raw_id, "session id")?;
    state.sessions.get(id).await
}
