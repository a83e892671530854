use std::time::Duration;

use anyhow::{ensure, Context, Result};

const DEFAULT_LLM_BASE_URL: &str = "https://api.groq.com/openai/v1";
const DEFAULT_LLM_MODEL: &str = "llama-3.1-70b-versatile";

/// Whether analyses go through the completion backend or straight to the
/// deterministic fallback (demo / offline mode).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnalysisMode {
    Live,
    Fallback,
}

/// Completion backend settings, shared by every analysis request.
#[derive(Debug, Clone)]
pub struct LlmConfig {
    pub api_key: Option<String>,
    pub base_url: String,
    pub model: String,
    pub temperature: f32,
    pub max_tokens: u32,
    pub timeout: Duration,
}

#[derive(Debug, Clone)]
pub struct WebflowConfig {
    pub api_token: String,
    pub players_collection_id: String,
    pub site_id: String,
    pub domain: Option<String>,
}

#[derive(Debug, Clone)]
pub struct AirtableConfig {
    pub api_key: String,
    pub base_id: String,
}

/// Application configuration loaded from environment variables.
/// Startup fails if required variables are missing or malformed.
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub analysis_mode: AnalysisMode,
    pub llm: LlmConfig,
    pub webflow: Option<WebflowConfig>,
    pub airtable: Option<AirtableConfig>,
    pub n8n_webhook_url: Option<String>,
    pub port: u16,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from an arbitrary key lookup so parsing can be tested
    /// without touching the process environment.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let require = |key: &str| {
            get(key).with_context(|| format!("Required environment variable '{key}' is not set"))
        };

        let analysis_mode = match get("ANALYSIS_MODE").as_deref() {
            None | Some("live") => AnalysisMode::Live,
            Some("fallback") | Some("demo") => AnalysisMode::Fallback,
            Some(other) => anyhow::bail!("ANALYSIS_MODE must be 'live' or 'fallback', got '{other}'"),
        };

        let api_key = get("GROQ_API_KEY");
        ensure!(
            analysis_mode == AnalysisMode::Fallback || api_key.is_some(),
            "Required environment variable 'GROQ_API_KEY' is not set (or set ANALYSIS_MODE=fallback)"
        );

        let temperature = get("LLM_TEMPERATURE")
            .unwrap_or_else(|| "0.3".to_string())
            .parse::<f32>()
            .context("LLM_TEMPERATURE must be a number")?;
        ensure!(
            (0.0..=1.0).contains(&temperature),
            "LLM_TEMPERATURE must be within [0, 1], got {temperature}"
        );

        let llm = LlmConfig {
            api_key,
            base_url: get("LLM_BASE_URL").unwrap_or_else(|| DEFAULT_LLM_BASE_URL.to_string()),
            model: get("LLM_MODEL").unwrap_or_else(|| DEFAULT_LLM_MODEL.to_string()),
            temperature,
            max_tokens: get("LLM_MAX_TOKENS")
                .unwrap_or_else(|| "1500".to_string())
                .parse::<u32>()
                .context("LLM_MAX_TOKENS must be a positive integer")?,
            timeout: Duration::from_secs(
                get("LLM_TIMEOUT_SECS")
                    .unwrap_or_else(|| "20".to_string())
                    .parse::<u64>()
                    .context("LLM_TIMEOUT_SECS must be a whole number of seconds")?,
            ),
        };

        // Webflow is all-or-nothing: a partial setup would fail on every sync.
        let webflow = match (
            get("WEBFLOW_API_TOKEN"),
            get("WEBFLOW_PLAYERS_COLLECTION_ID"),
            get("WEBFLOW_SITE_ID"),
        ) {
            (Some(api_token), Some(players_collection_id), Some(site_id)) => Some(WebflowConfig {
                api_token,
                players_collection_id,
                site_id,
                domain: get("WEBFLOW_DOMAIN"),
            }),
            _ => None,
        };

        let airtable = match (get("AIRTABLE_API_KEY"), get("AIRTABLE_BASE_ID")) {
            (Some(api_key), Some(base_id)) => Some(AirtableConfig { api_key, base_id }),
            _ => None,
        };

        Ok(Config {
            database_url: require("DATABASE_URL")?,
            analysis_mode,
            llm,
            webflow,
            airtable,
            n8n_webhook_url: get("N8N_WEBHOOK_URL"),
            port: get("PORT")
                .unwrap_or_else(|| "8080".to_string())
                .parse::<u16>()
                .context("PORT must be a valid port number")?,
            rust_log: get("RUST_LOG").unwrap_or_else(|| "info".to_string()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(pairs: &[(&str, &str)]) -> Result<Config> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults_applied() {
        let config = config_from(&[
            ("DATABASE_URL", "postgres://localhost/footpulse"),
            ("GROQ_API_KEY", "gsk_test"),
        ])
        .unwrap();

        assert_eq!(config.analysis_mode, AnalysisMode::Live);
        assert_eq!(config.port, 8080);
        assert_eq!(config.llm.model, DEFAULT_LLM_MODEL);
        assert!((config.llm.temperature - 0.3).abs() < f32::EPSILON);
        assert_eq!(config.llm.max_tokens, 1500);
        assert_eq!(config.llm.timeout, Duration::from_secs(20));
        assert!(config.webflow.is_none());
        assert!(config.airtable.is_none());
    }

    #[test]
    fn test_live_mode_requires_api_key() {
        let err = config_from(&[("DATABASE_URL", "postgres://localhost/footpulse")]).unwrap_err();
        assert!(err.to_string().contains("GROQ_API_KEY"));
    }

    #[test]
    fn test_fallback_mode_needs_no_api_key() {
        let config = config_from(&[
            ("DATABASE_URL", "postgres://localhost/footpulse"),
            ("ANALYSIS_MODE", "fallback"),
        ])
        .unwrap();
        assert_eq!(config.analysis_mode, AnalysisMode::Fallback);
        assert!(config.llm.api_key.is_none());
    }

    #[test]
    fn test_temperature_out_of_range_rejected() {
        let result = config_from(&[
            ("DATABASE_URL", "postgres://localhost/footpulse"),
            ("GROQ_API_KEY", "gsk_test"),
            ("LLM_TEMPERATURE", "1.4"),
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_partial_webflow_config_is_disabled() {
        let config = config_from(&[
            ("DATABASE_URL", "postgres://localhost/footpulse"),
            ("ANALYSIS_MODE", "fallback"),
            ("WEBFLOW_API_TOKEN", "wf_token"),
            ("WEBFLOW_SITE_ID", "site"),
        ])
        .unwrap();
        assert!(config.webflow.is_none());
    }
}
