//! Webflow CMS client for the public player directory.
//!
//! Uses the v1 collection API (`accept-version: 1.0.0`). Every mutation is
//! followed by a site publish so the change is visible on the live domain.

use chrono::{DateTime, SecondsFormat, Utc};
use reqwest::{Client, Method, RequestBuilder};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::cms::{check_status, CmsError};
use crate::config::WebflowConfig;

const WEBFLOW_API_URL: &str = "https://api.webflow.com";
const API_VERSION: &str = "1.0.0";
const SERVICE: &str = "webflow";
const DEFAULT_AVAILABILITY: &str = "Disponible";

/// The six per-skill scores as sent by the automation side. Accepted as any
/// integer and clamped to 0–100 when mapped to fields.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct StatLine {
    pub technique: i64,
    pub vitesse: i64,
    pub physique: i64,
    pub mental: i64,
    pub tactique: i64,
    pub precision: i64,
}

/// Player card data for a new collection item.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WebflowPlayer {
    pub name: String,
    pub position: Option<String>,
    pub age: Option<u32>,
    pub club: Option<String>,
    pub global_score: Option<i64>,
    pub profile_photo: Option<String>,
    #[serde(default)]
    pub stats: StatLine,
    pub availability: Option<String>,
    pub location: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatsUpdate {
    pub global_score: i64,
    #[serde(flatten)]
    pub stats: StatLine,
}

#[derive(Debug, Deserialize)]
struct ItemResponse {
    #[serde(rename = "_id")]
    id: Option<String>,
}

#[derive(Clone)]
pub struct WebflowClient {
    client: Client,
    base_url: String,
    token: String,
    collection_id: String,
    site_id: String,
    domain: Option<String>,
}

impl WebflowClient {
    pub fn new(client: Client, config: &WebflowConfig) -> Self {
        Self {
            client,
            base_url: WEBFLOW_API_URL.to_string(),
            token: config.api_token.clone(),
            collection_id: config.players_collection_id.clone(),
            site_id: config.site_id.clone(),
            domain: config.domain.clone(),
        }
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        self.client
            .request(method, format!("{}{path}", self.base_url))
            .bearer_auth(&self.token)
            .header("accept-version", API_VERSION)
    }

    /// Creates a collection item and returns its Webflow id.
    pub async fn create_item(&self, fields: Value) -> Result<String, CmsError> {
        let response = self
            .request(
                Method::POST,
                &format!("/collections/{}/items", self.collection_id),
            )
            .json(&json!({ "fields": fields }))
            .send()
            .await?;
        let item: ItemResponse = check_status(SERVICE, response).await?.json().await?;
        item.id.ok_or(CmsError::MissingField {
            service: SERVICE,
            field: "_id",
        })
    }

    pub async fn patch_item(&self, item_id: &str, fields: Value) -> Result<(), CmsError> {
        let response = self
            .request(
                Method::PATCH,
                &format!("/collections/{}/items/{item_id}", self.collection_id),
            )
            .json(&json!({ "fields": fields }))
            .send()
            .await?;
        check_status(SERVICE, response).await?;
        Ok(())
    }

    pub async fn publish_site(&self) -> Result<(), CmsError> {
        let response = self
            .request(Method::POST, &format!("/sites/{}/publish", self.site_id))
            .json(&publish_body(self.domain.as_deref()))
            .send()
            .await?;
        check_status(SERVICE, response).await?;
        Ok(())
    }
}

fn clamp_score(score: i64) -> i64 {
    score.clamp(0, 100)
}

/// Lowercased name with whitespace runs collapsed to `-`.
pub fn slugify(name: &str) -> String {
    name.to_lowercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("-")
}

fn stat_fields(stats: &StatLine) -> serde_json::Map<String, Value> {
    let mut fields = serde_json::Map::new();
    for (key, value) in [
        ("technique", stats.technique),
        ("vitesse", stats.vitesse),
        ("physique", stats.physique),
        ("mental", stats.mental),
        ("tactique", stats.tactique),
        ("precision", stats.precision),
    ] {
        fields.insert(key.to_string(), json!(clamp_score(value)));
    }
    fields
}

pub fn player_fields(player: &WebflowPlayer) -> Value {
    let mut fields = stat_fields(&player.stats);
    fields.insert("name".to_string(), json!(player.name.trim()));
    fields.insert("slug".to_string(), json!(slugify(&player.name)));
    fields.insert("position".to_string(), json!(player.position));
    fields.insert("age".to_string(), json!(player.age));
    fields.insert("club".to_string(), json!(player.club));
    fields.insert(
        "global-score".to_string(),
        json!(player.global_score.map(clamp_score)),
    );
    fields.insert("profile-photo".to_string(), json!(player.profile_photo));
    fields.insert(
        "availability".to_string(),
        json!(player
            .availability
            .as_deref()
            .unwrap_or(DEFAULT_AVAILABILITY)),
    );
    fields.insert("location".to_string(), json!(player.location));
    fields.insert("_archived".to_string(), json!(false));
    fields.insert("_draft".to_string(), json!(false));
    Value::Object(fields)
}

pub fn stats_fields(update: &StatsUpdate, updated_at: DateTime<Utc>) -> Value {
    let mut fields = stat_fields(&update.stats);
    fields.insert(
        "global-score".to_string(),
        json!(clamp_score(update.global_score)),
    );
    fields.insert(
        "last-updated".to_string(),
        json!(updated_at.to_rfc3339_opts(SecondsFormat::Millis, true)),
    );
    Value::Object(fields)
}

fn publish_body(domain: Option<&str>) -> Value {
    json!({ "domains": domain.into_iter().collect::<Vec<_>>() })
}
