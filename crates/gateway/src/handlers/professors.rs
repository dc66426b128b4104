//! Professor profile handlers

use axum::{
    extract::{Path, State},
    Json,
};
use uuid::Uuid;

use crate::AppState;
use scholarmatch_common::{
    errors::{AppError, Result},
    models::ProfessorProfile,
};

/// Get a cached professor profile by id.
///
/// Reads the persisted record directly, without the freshness gate: a
/// profile referenced by earlier match results stays retrievable even
/// after its cache entry ages out.
pub async fn get_professor(
    State(state): State<AppState>,
    Path(professor_id): Path<Uuid>,
) -> Result<Json<ProfessorProfile>> {
    let profile = state
        .professors
        .find_by_id(professor_id)
        .await?
        .ok_or_else(|| AppError::ProfessorNotFound {
            id: professor_id.to_string(),
        })?;

    Ok(Json(profile))
}
