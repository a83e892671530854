use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::analysis::models::PlayerProfile;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct PlayerRow {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub position: Option<String>,
    pub age: Option<i32>,
    pub club: Option<String>,
    pub global_score: Option<i32>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl PlayerRow {
    /// The stored player as analysis input.
    pub fn profile(&self) -> PlayerProfile {
        PlayerProfile {
            name: Some(self.name.clone()),
            position: self.position.clone(),
            age: self.age.and_then(|a| u32::try_from(a).ok()),
            club: self.club.clone(),
            video_ref: None,
        }
    }
}

/// Registration data for an upsert keyed by email.
#[derive(Debug, Clone)]
pub struct NewPlayer {
    pub name: String,
    pub email: String,
    pub position: Option<String>,
    pub age: Option<i32>,
    pub club: Option<String>,
}

impl NewPlayer {
    pub fn from_profile(name: &str, email: &str, profile: &PlayerProfile) -> Self {
        Self {
            name: name.to_string(),
            email: email.trim().to_lowercase(),
            position: profile.position_text().map(str::to_string),
            age: profile.age.and_then(|a| i32::try_from(a).ok()),
            club: profile.club_text().map(str::to_string),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisRow {
    pub id: Uuid,
    pub player_id: Uuid,
    pub video_url: Option<String>,
    pub global_score: i32,
    pub technique: i32,
    pub vitesse: i32,
    pub physique: i32,
    pub mental: i32,
    pub tactique: i32,
    pub precision: i32,
    pub strengths: Vec<String>,
    pub weaknesses: Vec<String>,
    pub recommendations: Vec<String>,
    pub position_analysis: Option<String>,
    pub potential: Option<String>,
    pub summary: Option<String>,
    /// "model" | "fallback"
    pub source: String,
    pub status: String,
    pub created_at: DateTime<Utc>,
}
