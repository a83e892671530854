//! Airtable client: backs the Softr player pages.
//!
//! Records in the `Players` table are matched on `Email`, so a player analyzed
//! twice updates the same row instead of duplicating it.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::cms::{check_status, AnalysisEvent, AnalysisSink, CmsError};
use crate::config::AirtableConfig;

const AIRTABLE_API_URL: &str = "https://api.airtable.com/v0";
const PLAYERS_TABLE: &str = "Players";
const SERVICE: &str = "airtable";

#[derive(Debug, Deserialize)]
struct AirtableRecord {
    fields: Value,
}

#[derive(Clone)]
pub struct AirtableClient {
    client: Client,
    api_key: String,
    base_id: String,
}

impl AirtableClient {
    pub fn new(client: Client, config: &AirtableConfig) -> Self {
        Self {
            client,
            api_key: config.api_key.clone(),
            base_id: config.base_id.clone(),
        }
    }

    fn table_url(&self) -> String {
        format!("{AIRTABLE_API_URL}/{}/{PLAYERS_TABLE}", self.base_id)
    }

    /// Upserts the player's row with the latest analysis.
    pub async fn upsert_player_record(&self, event: &AnalysisEvent) -> Result<(), CmsError> {
        let response = self
            .client
            .patch(self.table_url())
            .bearer_auth(&self.api_key)
            .json(&upsert_body(event))
            .send()
            .await?;
        check_status(SERVICE, response).await?;
        Ok(())
    }

    /// Looks up the Webflow item id stored on a Softr/Airtable player record.
    pub async fn webflow_id(&self, record_id: &str) -> Result<String, CmsError> {
        let response = self
            .client
            .get(format!("{}/{record_id}", self.table_url()))
            .bearer_auth(&self.api_key)
            .send()
            .await?;
        let record: AirtableRecord = check_status(SERVICE, response).await?.json().await?;
        record
            .fields
            .get("WebflowId")
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or(CmsError::MissingField {
                service: SERVICE,
                field: "WebflowId",
            })
    }
}

/// Field map for the `Players` table.
pub fn player_fields(event: &AnalysisEvent) -> Value {
    let a = &event.analysis;
    json!({
        "Email": event.player.email,
        "Name": event.player.name,
        "Position": event.player.position,
        "Club": event.player.club,
        "Global Score": a.global_score,
        "Technique": a.technique,
        "Vitesse": a.speed,
        "Physique": a.physical,
        "Mental": a.mental,
        "Tactique": a.tactical,
        "Précision": a.precision,
        "Strengths": a.strengths.join("\n"),
        "Weaknesses": a.weaknesses.join("\n"),
        "Recommendations": a.recommendations.join("\n"),
        "Potential": a.potential,
        "Analysis Status": "Completed",
    })
}

fn upsert_body(event: &AnalysisEvent) -> Value {
    json!({
        "performUpsert": { "fieldsToMergeOn": ["Email"] },
        "typecast": true,
        "records": [{ "fields": player_fields(event) }],
    })
}

#[async_trait]
impl AnalysisSink for AirtableClient {
    async fn publish(&self, event: &AnalysisEvent) -> Result<(), CmsError> {
        self.upsert_player_record(event).await
    }

    fn name(&self) -> &'static str {
        SERVICE
    }
}
