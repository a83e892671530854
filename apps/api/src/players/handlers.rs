//! Axum route handlers for player records.

use axum::{
    extract::{Path, State},
    Json,
};
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::player::AnalysisRow;
use crate::state::AppState;

/// GET /api/v1/players/:id/analyses
///
/// Stored analyses for a player, newest first. Feeds the player and admin dashboards.
pub async fn handle_list_analyses(
    State(state): State<AppState>,
    Path(player_id): Path<Uuid>,
) -> Result<Json<Vec<AnalysisRow>>, AppError> {
    state
        .store
        .find_player(player_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Player {player_id} not found")))?;

    let analyses = state.store.list_analyses(player_id).await?;
    Ok(Json(analyses))
}
