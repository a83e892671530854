//! Axum route handlers for the analysis API.

use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::info;
use uuid::Uuid;

use crate::analysis::models::{AnalysisSource, PlayerAnalysis, PlayerProfile};
use crate::analysis::parser::normalize_analysis;
use crate::cms::AnalysisEvent;
use crate::errors::AppError;
use crate::models::player::{NewPlayer, PlayerRow};
use crate::players::store::NewAnalysis;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyzeRequest {
    #[serde(flatten)]
    pub profile: PlayerProfile,
    /// When present the analysis is saved against the player with this email.
    #[serde(default)]
    pub email: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DemoRequest {
    #[serde(default)]
    pub player_email: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisCompleteRequest {
    pub player_id: Uuid,
    pub analysis: Map<String, Value>,
    #[serde(default)]
    pub video_url: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyzeResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub player_id: Option<Uuid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub analysis_id: Option<Uuid>,
    pub source: AnalysisSource,
    pub analysis: PlayerAnalysis,
    pub message: String,
}

/// POST /api/v1/analyze
pub async fn handle_analyze(
    State(state): State<AppState>,
    Json(req): Json<AnalyzeRequest>,
) -> Result<Json<AnalyzeResponse>, AppError> {
    // Registration problems are reported before spending a completion call.
    let registration = match non_blank(req.email.as_deref()) {
        Some(email) => Some(registration(&req.profile, email)?),
        None => None,
    };

    let outcome = state.analyzer.analyze(&req.profile).await?;

    let Some(new_player) = registration else {
        return Ok(Json(AnalyzeResponse {
            success: true,
            player_id: None,
            analysis_id: None,
            source: outcome.source,
            analysis: outcome.analysis,
            message: "Analyse terminée".to_string(),
        }));
    };

    let player = state.store.upsert_player(&new_player).await?;
    let player_id = player.id;
    let analysis_id = record_analysis(
        &state,
        player,
        &outcome.analysis,
        outcome.source,
        req.profile.video_ref.as_deref(),
    )
    .await?;

    Ok(Json(AnalyzeResponse {
        success: true,
        player_id: Some(player_id),
        analysis_id: Some(analysis_id),
        source: outcome.source,
        analysis: outcome.analysis,
        message: "Analyse terminée et enregistrée".to_string(),
    }))
}

/// POST /api/v1/analyze/demo
///
/// Re-analyzes a registered player from their stored profile.
pub async fn handle_analyze_demo(
    State(state): State<AppState>,
    Json(req): Json<DemoRequest>,
) -> Result<Json<AnalyzeResponse>, AppError> {
    let email = non_blank(req.player_email.as_deref())
        .ok_or_else(|| AppError::Validation("playerEmail is required".to_string()))?;

    let player = state
        .store
        .find_player_by_email(email)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Player {email} not found")))?;

    let outcome = state.analyzer.analyze(&player.profile()).await?;
    let player_id = player.id;
    let analysis_id =
        record_analysis(&state, player, &outcome.analysis, outcome.source, None).await?;

    Ok(Json(AnalyzeResponse {
        success: true,
        player_id: Some(player_id),
        analysis_id: Some(analysis_id),
        source: outcome.source,
        analysis: outcome.analysis,
        message: "Analyse de démonstration terminée".to_string(),
    }))
}

/// POST /api/v1/webhook/analysis-complete
///
/// Callback from the automation workflow once it has produced an analysis
/// on its own. The payload goes through the same validation as model output.
pub async fn handle_analysis_complete(
    State(state): State<AppState>,
    Json(req): Json<AnalysisCompleteRequest>,
) -> Result<Json<AnalyzeResponse>, AppError> {
    let player = state
        .store
        .find_player(req.player_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Player {} not found", req.player_id)))?;

    let analysis = normalize_analysis(&req.analysis, &player.profile())
        .map_err(|e| AppError::Validation(format!("Invalid analysis payload: {e}")))?;

    let analysis_id = record_analysis(
        &state,
        player,
        &analysis,
        AnalysisSource::Model,
        non_blank(req.video_url.as_deref()),
    )
    .await?;

    Ok(Json(AnalyzeResponse {
        success: true,
        player_id: Some(req.player_id),
        analysis_id: Some(analysis_id),
        source: AnalysisSource::Model,
        analysis,
        message: "Analyse enregistrée".to_string(),
    }))
}

fn registration(profile: &PlayerProfile, email: &str) -> Result<NewPlayer, AppError> {
    let name = profile.display_name().ok_or_else(|| {
        AppError::Validation("A player name is required to save an analysis".to_string())
    })?;
    if !email.contains('@') {
        return Err(AppError::Validation(format!("Invalid email: {email}")));
    }
    Ok(NewPlayer::from_profile(name, email, profile))
}

/// Stores the analysis with the player's new score, then notifies the sinks.
async fn record_analysis(
    state: &AppState,
    mut player: PlayerRow,
    analysis: &PlayerAnalysis,
    source: AnalysisSource,
    video_url: Option<&str>,
) -> Result<Uuid, AppError> {
    let row = state
        .store
        .record_analysis(&NewAnalysis {
            player_id: player.id,
            video_url,
            analysis,
            source,
        })
        .await?;
    info!(
        "Stored {} analysis {} for player {} (globalScore={})",
        source.as_str(),
        row.id,
        player.id,
        analysis.global_score
    );

    player.global_score = Some(analysis.global_score.into());
    state.publisher.spawn_publish(AnalysisEvent {
        analysis_id: row.id,
        player,
        analysis: analysis.clone(),
        video_url: video_url.map(str::to_string),
    });
    Ok(row.id)
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|s| !s.is_empty())
}
