//! Response parsing for model output.
//!
//! Models wrap their JSON in chatter ("Voici l'analyse : {...} Bonne chance !"),
//! code fences, or both. Extraction is best-effort: scan for the first balanced
//! `{...}` span that parses as a JSON object, skipping braces inside string
//! literals. It is not a strict JSON parser and does not try to be.

use serde_json::{Map, Value};
use thiserror::Error;

use crate::analysis::fallback::{describe_position, potential_label};
use crate::analysis::models::{PlayerAnalysis, PlayerProfile};

/// Keys that must be present for a model answer to be accepted.
pub const REQUIRED_FIELDS: [&str; 10] = [
    "globalScore",
    "technique",
    "vitesse",
    "physique",
    "mental",
    "tactique",
    "precision",
    "strengths",
    "weaknesses",
    "recommendations",
];

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExtractionError {
    /// Parse failure: no balanced span in the text is a JSON object.
    #[error("no JSON object found in model output")]
    NoJsonObject,

    /// Validation failure: the object lacks a required key.
    #[error("missing required field `{0}`")]
    MissingField(&'static str),

    /// Validation failure: a required key has an unusable value.
    #[error("field `{field}` {reason}")]
    InvalidField {
        field: &'static str,
        reason: &'static str,
    },
}

/// Returns the first balanced `{...}` span of `text` that parses as an object.
pub fn extract_json_object(text: &str) -> Option<Map<String, Value>> {
    text.match_indices('{').find_map(|(start, _)| {
        let len = balanced_span_len(&text.as_bytes()[start..])?;
        match serde_json::from_str::<Value>(&text[start..start + len]) {
            Ok(Value::Object(map)) => Some(map),
            _ => None,
        }
    })
}

/// Length of the brace-balanced prefix of `bytes` (which starts with `{`),
/// or `None` when the braces never close. Braces inside strings are ignored.
fn balanced_span_len(bytes: &[u8]) -> Option<usize> {
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (i, &b) in bytes.iter().enumerate() {
        if in_string {
            if escaped {
                escaped = false;
            } else if b == b'\\' {
                escaped = true;
            } else if b == b'"' {
                in_string = false;
            }
            continue;
        }
        match b {
            b'"' => in_string = true,
            b'{' => depth += 1,
            b'}' => {
                depth = depth.checked_sub(1)?;
                if depth == 0 {
                    return Some(i + 1);
                }
            }
            _ => {}
        }
    }
    None
}

/// Extracts and validates a model answer into a normalized analysis.
///
/// Scores are rounded and clamped to 0–100. `positionAnalysis` and `potential`
/// are optional in the answer; when absent they are filled from the profile.
pub fn parse_analysis(
    raw: &str,
    profile: &PlayerProfile,
) -> Result<PlayerAnalysis, ExtractionError> {
    let object = extract_json_object(raw).ok_or(ExtractionError::NoJsonObject)?;
    normalize_analysis(&object, profile)
}

/// Validates an already-decoded analysis object. Shared with the workflow
/// webhook, whose payloads come from the same model.
pub fn normalize_analysis(
    object: &Map<String, Value>,
    profile: &PlayerProfile,
) -> Result<PlayerAnalysis, ExtractionError> {
    if let Some(missing) = REQUIRED_FIELDS.iter().find(|f| !object.contains_key(**f)) {
        return Err(ExtractionError::MissingField(*missing));
    }

    Ok(PlayerAnalysis {
        global_score: score(object, "globalScore")?,
        technique: score(object, "technique")?,
        speed: score(object, "vitesse")?,
        physical: score(object, "physique")?,
        mental: score(object, "mental")?,
        tactical: score(object, "tactique")?,
        precision: score(object, "precision")?,
        strengths: text_list(object, "strengths")?,
        weaknesses: text_list(object, "weaknesses")?,
        recommendations: text_list(object, "recommendations")?,
        position_analysis: text(object, "positionAnalysis")
            .unwrap_or_else(|| describe_position(profile)),
        potential: text(object, "potential")
            .unwrap_or_else(|| potential_label(profile.age).to_string()),
        summary: text(object, "summary"),
    })
}

fn score(object: &Map<String, Value>, field: &'static str) -> Result<u8, ExtractionError> {
    let number = match object.get(field) {
        Some(Value::Number(n)) => n.as_f64(),
        // Some models quote numbers
        Some(Value::String(s)) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    number
        .filter(|n| n.is_finite())
        .map(|n| n.round().clamp(0.0, 100.0) as u8)
        .ok_or(ExtractionError::InvalidField {
            field,
            reason: "is not a number",
        })
}

fn text_list(object: &Map<String, Value>, field: &'static str) -> Result<Vec<String>, ExtractionError> {
    match object.get(field) {
        Some(Value::Array(items)) => Ok(items
            .iter()
            .filter_map(Value::as_str)
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect()),
        Some(Value::String(single)) if !single.trim().is_empty() => {
            Ok(vec![single.trim().to_string()])
        }
        _ => Err(ExtractionError::InvalidField {
            field,
            reason: "is not a list of strings",
        }),
    }
}

fn text(object: &Map<String, Value>, field: &str) -> Option<String> {
    object
        .get(field)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}
