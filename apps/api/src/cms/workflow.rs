//! n8n workflow hook: notifies the automation pipeline of completed analyses.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::Serialize;
use uuid::Uuid;

use crate::analysis::models::PlayerAnalysis;
use crate::cms::{check_status, AnalysisEvent, AnalysisSink, CmsError};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct AnalysisCompleted<'a> {
    #[serde(rename = "type")]
    kind: &'static str,
    player_id: Uuid,
    analysis_id: Uuid,
    analysis: &'a PlayerAnalysis,
    timestamp: DateTime<Utc>,
}

pub struct WorkflowHook {
    client: Client,
    url: String,
}

impl WorkflowHook {
    pub fn new(client: Client, url: String) -> Self {
        Self { client, url }
    }
}

fn payload(event: &AnalysisEvent, timestamp: DateTime<Utc>) -> AnalysisCompleted<'_> {
    AnalysisCompleted {
        kind: "analysis_completed",
        player_id: event.player.id,
        analysis_id: event.analysis_id,
        analysis: &event.analysis,
        timestamp,
    }
}

#[async_trait]
impl AnalysisSink for WorkflowHook {
    async fn publish(&self, event: &AnalysisEvent) -> Result<(), CmsError> {
        let response = self
            .client
            .post(&self.url)
            .json(&payload(event, Utc::now()))
            .send()
            .await?;
        check_status("n8n", response).await?;
        Ok(())
    }

    fn name(&self) -> &'static str {
        "n8n"
    }
}
