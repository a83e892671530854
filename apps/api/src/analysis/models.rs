use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Upper bound for a plausible player age; anything above is a data-entry error.
pub const MAX_PLAYER_AGE: u32 = 60;

/// The ten recognized on-field roles. French labels are the wire values used by
/// the registration forms, the database and the CMS collections.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Position {
    #[serde(rename = "Gardien")]
    Goalkeeper,
    #[serde(rename = "Défenseur central")]
    CentreBack,
    #[serde(rename = "Latéral droit")]
    RightBack,
    #[serde(rename = "Latéral gauche")]
    LeftBack,
    #[serde(rename = "Milieu défensif")]
    DefensiveMidfielder,
    #[serde(rename = "Milieu central")]
    CentralMidfielder,
    #[serde(rename = "Milieu offensif")]
    AttackingMidfielder,
    #[serde(rename = "Ailier droit")]
    RightWinger,
    #[serde(rename = "Ailier gauche")]
    LeftWinger,
    #[serde(rename = "Attaquant")]
    Striker,
}

impl Position {
    pub const ALL: [Position; 10] = [
        Position::Goalkeeper,
        Position::CentreBack,
        Position::RightBack,
        Position::LeftBack,
        Position::DefensiveMidfielder,
        Position::CentralMidfielder,
        Position::AttackingMidfielder,
        Position::RightWinger,
        Position::LeftWinger,
        Position::Striker,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Position::Goalkeeper => "Gardien",
            Position::CentreBack => "Défenseur central",
            Position::RightBack => "Latéral droit",
            Position::LeftBack => "Latéral gauche",
            Position::DefensiveMidfielder => "Milieu défensif",
            Position::CentralMidfielder => "Milieu central",
            Position::AttackingMidfielder => "Milieu offensif",
            Position::RightWinger => "Ailier droit",
            Position::LeftWinger => "Ailier gauche",
            Position::Striker => "Attaquant",
        }
    }

    /// Case-insensitive lookup by label. `None` means the unknown-position branch.
    pub fn from_label(label: &str) -> Option<Position> {
        let wanted = label.trim().to_lowercase();
        Position::ALL
            .into_iter()
            .find(|p| p.label().to_lowercase() == wanted)
    }
}

/// Profile submitted for analysis. Position stays free text so unrecognized
/// roles can still be analyzed with the generic tables.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerProfile {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub position: Option<String>,
    #[serde(default)]
    pub age: Option<u32>,
    #[serde(default)]
    pub club: Option<String>,
    /// Opaque video reference (URL or upload id). Never inspected.
    #[serde(default)]
    pub video_ref: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InvalidProfileError {
    #[error("profile must carry at least a name or a position")]
    MissingIdentity,

    #[error("age {0} is outside the accepted range (1-60)")]
    ImplausibleAge(u32),
}

impl PlayerProfile {
    pub fn new(name: &str, position: &str, age: u32, club: Option<&str>) -> Self {
        Self {
            name: Some(name.to_string()),
            position: Some(position.to_string()),
            age: Some(age),
            club: club.map(str::to_string),
            video_ref: None,
        }
    }

    /// Trimmed name, `None` when absent or blank.
    pub fn display_name(&self) -> Option<&str> {
        non_blank(self.name.as_deref())
    }

    /// Trimmed position text, `None` when absent or blank.
    pub fn position_text(&self) -> Option<&str> {
        non_blank(self.position.as_deref())
    }

    pub fn club_text(&self) -> Option<&str> {
        non_blank(self.club.as_deref())
    }

    pub fn recognized_position(&self) -> Option<Position> {
        self.position_text().and_then(Position::from_label)
    }

    pub fn validate(&self) -> Result<(), InvalidProfileError> {
        if self.display_name().is_none() && self.position_text().is_none() {
            return Err(InvalidProfileError::MissingIdentity);
        }
        if let Some(age) = self.age {
            if age == 0 || age > MAX_PLAYER_AGE {
                return Err(InvalidProfileError::ImplausibleAge(age));
            }
        }
        Ok(())
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|s| !s.is_empty())
}

/// The normalized skill assessment. Field names on the wire follow the
/// persistence schema (`vitesse`, `physique`, `tactique`); every score is 0–100.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerAnalysis {
    pub global_score: u8,
    pub technique: u8,
    #[serde(rename = "vitesse")]
    pub speed: u8,
    #[serde(rename = "physique")]
    pub physical: u8,
    pub mental: u8,
    #[serde(rename = "tactique")]
    pub tactical: u8,
    pub precision: u8,
    pub strengths: Vec<String>,
    pub weaknesses: Vec<String>,
    pub recommendations: Vec<String>,
    pub position_analysis: String,
    pub potential: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
}

impl PlayerAnalysis {
    /// Scores in display order: global first, then the six criteria.
    pub fn scores(&self) -> [u8; 7] {
        [
            self.global_score,
            self.technique,
            self.speed,
            self.physical,
            self.mental,
            self.tactical,
            self.precision,
        ]
    }
}

/// Where an analysis came from. Reported alongside the analysis, never inside it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnalysisSource {
    Model,
    Fallback,
}

impl AnalysisSource {
    pub fn as_str(self) -> &'static str {
        match self {
            AnalysisSource::Model => "model",
            AnalysisSource::Fallback => "fallback",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnalysisOutcome {
    pub analysis: PlayerAnalysis,
    pub source: AnalysisSource,
}
