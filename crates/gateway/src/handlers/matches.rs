//! Match orchestration handlers
//!
//! Starting a match stamps the session into `processing` and spawns the
//! pipeline as a background task; callers then poll status until the run
//! reaches a terminal state and fetch results once completed.

use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::AppState;
use scholarmatch_common::{
    errors::{AppError, Result},
    models::{MatchResult, MatchStatus},
};

/// Request to start the matching process
#[derive(Debug, Deserialize, Validate)]
pub struct MatchRequest {
    pub session_id: String,

    #[validate(length(min = 1, message = "university is required"))]
    pub university: String,

    #[validate(length(min = 1, message = "at least one research interest is required"))]
    pub research_interests: Vec<String>,

    #[serde(default)]
    pub file_ids: Vec<String>,
}

/// Match progress status
#[derive(Serialize)]
pub struct MatchStatusResponse {
    pub match_id: String,
    pub status: String,
    pub progress: u8,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_step: Option<String>,
}

/// Match results response
#[derive(Serialize)]
pub struct MatchResultsResponse {
    pub match_id: String,
    pub status: String,
    pub results: Vec<MatchResult>,
}

#[derive(Deserialize)]
pub struct SessionQuery {
    pub session_id: String,
}

/// Initiate the matching process
pub async fn start_match(
    State(state): State<AppState>,
    Json(request): Json<MatchRequest>,
) -> Result<Json<MatchStatusResponse>> {
    request.validate().map_err(|e| AppError::Validation {
        message: e.to_string(),
    })?;

    let mut session = state
        .sessions
        .get(&request.session_id)
        .await?
        .ok_or_else(|| AppError::SessionNotFound {
            id: request.session_id.clone(),
        })?;

    let match_id = Uuid::new_v4().to_string();

    session.university = Some(request.university.clone());
    session.research_interests = request.research_interests.clone();
    session.file_ids = request.file_ids.clone();
    session.match_id = Some(match_id.clone());
    session.match_status = MatchStatus::Processing;
    session.match_progress = 0;
    session.current_step = Some("Initializing".to_string());
    session.match_results = Vec::new();
    session.match_start_time = Some(chrono::Utc::now());
    session.total_match_time_secs = None;
    state.sessions.put(&request.session_id, &session).await?;

    tracing::info!(
        session_id = %request.session_id,
        match_id = %match_id,
        university = %request.university,
        "Matching run started"
    );

    let pipeline = state.pipeline.clone();
    let session_id = request.session_id.clone();
    tokio::spawn(async move {
        pipeline
            .run_detached(
                &session_id,
                &request.university,
                &request.research_interests,
                &request.file_ids,
            )
            .await;
    });

    Ok(Json(MatchStatusResponse {
        match_id,
        status: MatchStatus::Processing.as_str().to_string(),
        progress: 0,
        current_step: Some("Initializing".to_string()),
    }))
}

/// Check matching progress
pub async fn get_status(
    State(state): State<AppState>,
    Path(match_id): Path<String>,
    Query(query): Query<SessionQuery>,
) -> Result<Json<MatchStatusResponse>> {
    let session = find_match_session(&state, &query.session_id, &match_id).await?;

    Ok(Json(MatchStatusResponse {
        match_id,
        status: session.match_status.as_str().to_string(),
        progress: session.match_progress,
        current_step: session.current_step,
    }))
}

/// Retrieve match results
pub async fn get_results(
    State(state): State<AppState>,
    Path(match_id): Path<String>,
    Query(query): Query<SessionQuery>,
) -> Result<Json<MatchResultsResponse>> {
    let session = find_match_session(&state, &query.session_id, &match_id).await?;

    if session.match_status != MatchStatus::Completed {
        return Err(AppError::MatchNotReady {
            id: match_id.clone(),
        });
    }

    Ok(Json(MatchResultsResponse {
        match_id,
        status: MatchStatus::Completed.as_str().to_string(),
        results: session.match_results,
    }))
}

async fn find_match_session(
    state: &AppState,
    session_id: &str,
    match_id: &str,
) -> Result<scholarmatch_common::models::MatchSession> {
    let session = state.sessions.get(session_id).await?;

    match session {
        Some(session) if session.match_id.as_deref() == Some(match_id) => Ok(session),
        _ => Err(AppError::MatchNotFound {
            id: match_id.to_string(),
        }),
    }
}
