//! CMS synchronization: one-way publication of analyses to external platforms.
//!
//! Every sink is optional and configured from the environment. Publication
//! runs in the background after an analysis is stored; a failing sink is
//! logged and never fails the user request.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use thiserror::Error;
use tracing::{info, warn};
use uuid::Uuid;

use crate::analysis::models::PlayerAnalysis;
use crate::config::Config;
use crate::models::player::PlayerRow;

pub mod airtable;
pub mod handlers;
pub mod webflow;
pub mod workflow;

/// Upper bound for any single request to a CMS platform or webhook.
pub const CMS_REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

/// HTTP client shared by every CMS integration.
pub fn http_client() -> Result<Client, CmsError> {
    Ok(Client::builder().timeout(CMS_REQUEST_TIMEOUT).build()?)
}

#[derive(Debug, Error)]
pub enum CmsError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("{service} API error (status {status}): {message}")]
    Api {
        service: &'static str,
        status: u16,
        message: String,
    },

    #[error("{service} response is missing `{field}`")]
    MissingField {
        service: &'static str,
        field: &'static str,
    },
}

/// A stored analysis, as handed to the sinks.
#[derive(Debug, Clone)]
pub struct AnalysisEvent {
    pub analysis_id: Uuid,
    pub player: PlayerRow,
    pub analysis: PlayerAnalysis,
    pub video_url: Option<String>,
}

/// A destination for completed analyses.
#[async_trait]
pub trait AnalysisSink: Send + Sync {
    async fn publish(&self, event: &AnalysisEvent) -> Result<(), CmsError>;

    fn name(&self) -> &'static str;
}

/// Fans an event out to every configured sink.
#[derive(Clone, Default)]
pub struct Publisher {
    sinks: Vec<Arc<dyn AnalysisSink>>,
}

impl Publisher {
    pub fn from_config(config: &Config, http: &Client) -> Self {
        let mut publisher = Publisher::default();
        if let Some(url) = &config.n8n_webhook_url {
            publisher = publisher.with_sink(Arc::new(workflow::WorkflowHook::new(
                http.clone(),
                url.clone(),
            )));
        }
        if let Some(airtable) = &config.airtable {
            publisher = publisher.with_sink(Arc::new(airtable::AirtableClient::new(
                http.clone(),
                airtable,
            )));
        }
        publisher
    }

    pub fn with_sink(mut self, sink: Arc<dyn AnalysisSink>) -> Self {
        self.sinks.push(sink);
        self
    }

    pub fn sink_names(&self) -> Vec<&'static str> {
        self.sinks.iter().map(|s| s.name()).collect()
    }

    /// Publishes to every sink in order; returns how many failed.
    pub async fn publish(&self, event: &AnalysisEvent) -> usize {
        let mut failures = 0;
        for sink in &self.sinks {
            match sink.publish(event).await {
                Ok(()) => info!(
                    "Published analysis {} to {}",
                    event.analysis_id,
                    sink.name()
                ),
                Err(e) => {
                    failures += 1;
                    warn!(
                        "Publishing analysis {} to {} failed: {e}",
                        event.analysis_id,
                        sink.name()
                    );
                }
            }
        }
        failures
    }

    /// Fire-and-forget variant used by request handlers.
    pub fn spawn_publish(&self, event: AnalysisEvent) {
        if self.sinks.is_empty() {
            return;
        }
        let publisher = self.clone();
        tokio::spawn(async move {
            publisher.publish(&event).await;
        });
    }
}

/// Turns a non-success response into `CmsError::Api`.
pub(crate) async fn check_status(
    service: &'static str,
    response: reqwest::Response,
) -> Result<reqwest::Response, CmsError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let message = response.text().await.unwrap_or_default();
    Err(CmsError::Api {
        service,
        status: status.as_u16(),
        message,
    })
}

#[cfg(test)]
pub mod tests {
    use super::*;
    use crate::analysis::fallback::fallback_analysis;
    use crate::config::{AnalysisMode, LlmConfig};
    use chrono::Utc;
    use std::sync::Mutex;
    use std::time::Duration;

    /// Sink recording the analysis ids it receives, optionally failing.
    #[derive(Default)]
    pub struct RecordingSink {
        pub received: Mutex<Vec<Uuid>>,
        pub fail: bool,
    }

    #[async_trait]
    impl AnalysisSink for RecordingSink {
        async fn publish(&self, event: &AnalysisEvent) -> Result<(), CmsError> {
            self.received.lock().unwrap().push(event.analysis_id);
            if self.fail {
                return Err(CmsError::Api {
                    service: "recording",
                    status: 500,
                    message: "unavailable".to_string(),
                });
            }
            Ok(())
        }

        fn name(&self) -> &'static str {
            "recording"
        }
    }

    pub fn sample_player() -> PlayerRow {
        let now = Utc::now();
        PlayerRow {
            id: Uuid::new_v4(),
            name: "Test Player".to_string(),
            email: "test@example.com".to_string(),
            position: Some("Milieu offensif".to_string()),
            age: Some(19),
            club: Some("FC Example".to_string()),
            global_score: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn sample_event() -> AnalysisEvent {
        let player = sample_player();
        AnalysisEvent {
            analysis_id: Uuid::new_v4(),
            analysis: fallback_analysis(&player.profile()),
            player,
            video_url: Some("https://videos.example.com/match.mp4".to_string()),
        }
    }

    fn base_config() -> Config {
        Config {
            database_url: "postgres://localhost/footpulse".to_string(),
            analysis_mode: AnalysisMode::Fallback,
            llm: LlmConfig {
                api_key: None,
                base_url: "https://api.groq.com/openai/v1".to_string(),
                model: "llama-3.1-70b-versatile".to_string(),
                temperature: 0.3,
                max_tokens: 1500,
                timeout: Duration::from_secs(20),
            },
            webflow: None,
            airtable: None,
            n8n_webhook_url: None,
            port: 8080,
            rust_log: "info".to_string(),
        }
    }

    #[tokio::test]
    async fn test_publish_continues_after_failing_sink() {
        let failing = Arc::new(RecordingSink {
            fail: true,
            ..Default::default()
        });
        let healthy = Arc::new(RecordingSink::default());
        let publisher = Publisher::default()
            .with_sink(failing.clone())
            .with_sink(healthy.clone());

        let event = sample_event();
        let failures = publisher.publish(&event).await;

        assert_eq!(failures, 1);
        assert_eq!(*healthy.received.lock().unwrap(), vec![event.analysis_id]);
    }

    #[test]
    fn test_publisher_from_config_only_enables_configured_sinks() {
        let http = http_client().unwrap();
        assert!(Publisher::from_config(&base_config(), &http)
            .sink_names()
            .is_empty());

        let mut config = base_config();
        config.n8n_webhook_url = Some("https://n8n.example.com/webhook/analysis".to_string());
        assert_eq!(
            Publisher::from_config(&config, &http).sink_names(),
            vec!["n8n"]
        );
    }
}
