//! Session management handlers

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::Serialize;
use uuid::Uuid;

use crate::AppState;
use scholarmatch_common::{
    errors::{AppError, Result},
    models::MatchSession,
};

/// Create session response
#[derive(Serialize)]
pub struct CreateSessionResponse {
    pub session_id: String,
}

/// Session state response
#[derive(Serialize)]
pub struct SessionResponse {
    pub session_id: String,
    pub university: Option<String>,
    pub research_interests: Vec<String>,
    pub match_status: String,
    pub match_progress: u8,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_step: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
}

/// Create a new session
pub async fn create_session(
    State(state): State<AppState>,
) -> Result<(StatusCode, Json<CreateSessionResponse>)> {
    let session_id = Uuid::new_v4().to_string();
    state.sessions.put(&session_id, &MatchSession::new()).await?;

    tracing::info!(session_id = %session_id, "Session created");

    Ok((
        StatusCode::CREATED,
        Json(CreateSessionResponse { session_id }),
    ))
}

/// Get session state
pub async fn get_session(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> Result<Json<SessionResponse>> {
    let session = state
        .sessions
        .get(&session_id)
        .await?
        .ok_or_else(|| AppError::SessionNotFound {
            id: session_id.clone(),
        })?;

    Ok(Json(SessionResponse {
        session_id,
        university: session.university,
        research_interests: session.research_interests,
        match_status: session.match_status.as_str().to_string(),
        match_progress: session.match_progress,
        current_step: session.current_step,
        created_at: session.created_at.map(|at| at.to_rfc3339()),
    }))
}
