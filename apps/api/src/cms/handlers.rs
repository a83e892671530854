use axum::{extract::State, Json};
use chrono::Utc;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::info;

use crate::cms::webflow::{player_fields, stats_fields, StatsUpdate, WebflowClient, WebflowPlayer};
use crate::errors::AppError;
use crate::state::AppState;

/// Body of a Webflow sync call, dispatched on `action`.
#[derive(Debug, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum SyncRequest {
    CreatePlayerProfile {
        data: WebflowPlayer,
    },
    UpdateStats {
        #[serde(rename = "playerId")]
        player_id: String,
        data: StatsUpdate,
    },
    AddVideoAnalysis {
        #[serde(rename = "playerId")]
        player_id: String,
        data: Value,
    },
}

/// POST /api/v1/cms/webflow-sync
///
/// `playerId` is the Airtable record id; the matching Webflow item id is read
/// from that record.
pub async fn handle_webflow_sync(
    State(state): State<AppState>,
    Json(body): Json<Value>,
) -> Result<Json<Value>, AppError> {
    let request: SyncRequest = serde_json::from_value(body)
        .map_err(|e| AppError::Validation(format!("Unrecognized sync request: {e}")))?;

    let webflow = state
        .webflow
        .as_ref()
        .ok_or_else(|| AppError::ServiceUnavailable("Webflow sync is not configured".to_string()))?;

    match request {
        SyncRequest::CreatePlayerProfile { data } => {
            if data.name.trim().is_empty() {
                return Err(AppError::Validation("Player name is required".to_string()));
            }
            let webflow_id = webflow.create_item(player_fields(&data)).await?;
            webflow.publish_site().await?;
            info!("Created Webflow profile {webflow_id} for {}", data.name.trim());
            Ok(Json(json!({ "success": true, "webflowId": webflow_id })))
        }
        SyncRequest::UpdateStats { player_id, data } => {
            let item_id = webflow_item_id(&state, &player_id).await?;
            patch_and_publish(webflow, &item_id, stats_fields(&data, Utc::now())).await?;
            info!("Updated Webflow stats for {player_id}");
            Ok(Json(json!({ "success": true })))
        }
        SyncRequest::AddVideoAnalysis { player_id, data } => {
            let item_id = webflow_item_id(&state, &player_id).await?;
            patch_and_publish(webflow, &item_id, json!({ "video-analysis": data })).await?;
            info!("Attached video analysis to Webflow profile of {player_id}");
            Ok(Json(json!({ "success": true })))
        }
    }
}

async fn webflow_item_id(state: &AppState, player_id: &str) -> Result<String, AppError> {
    let airtable = state.airtable.as_ref().ok_or_else(|| {
        AppError::ServiceUnavailable("Airtable is required to resolve Webflow ids".to_string())
    })?;
    Ok(airtable.webflow_id(player_id).await?)
}

async fn patch_and_publish(
    webflow: &WebflowClient,
    item_id: &str,
    fields: Value,
) -> Result<(), AppError> {
    webflow.patch_item(item_id, fields).await?;
    webflow.publish_site().await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::players::store::memory::MemoryPlayerStore;
    use crate::state::testing::fallback_state;

    #[test]
    fn test_sync_request_dispatch() {
        let request: SyncRequest = serde_json::from_value(json!({
            "action": "update_stats",
            "playerId": "rec123",
            "data": { "globalScore": 80, "technique": 75 }
        }))
        .unwrap();

        match request {
            SyncRequest::UpdateStats { player_id, data } => {
                assert_eq!(player_id, "rec123");
                assert_eq!(data.global_score, 80);
                assert_eq!(data.stats.technique, 75);
            }
            other => panic!("unexpected request: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_unknown_action_is_rejected() {
        let state = fallback_state(Arc::new(MemoryPlayerStore::default()));

        let result = handle_webflow_sync(
            State(state),
            Json(json!({ "action": "delete_everything", "data": {} })),
        )
        .await;

        assert!(matches!(result, Err(AppError::Validation(_))));
    }

    #[tokio::test]
    async fn test_unconfigured_webflow_is_unavailable() {
        let state = fallback_state(Arc::new(MemoryPlayerStore::default()));

        let result = handle_webflow_sync(
            State(state),
            Json(json!({ "action": "create_player_profile", "data": { "name": "Lucas Martin" } })),
        )
        .await;

        assert!(matches!(result, Err(AppError::ServiceUnavailable(_))));
    }
}
