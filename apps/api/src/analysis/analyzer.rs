//! Player Analysis: orchestrates prompt → completion → parse, with fallback.
//!
//! Flow: validate profile → build prompt → completion (under timeout) →
//!       extract + validate JSON → `PlayerAnalysis`.
//!
//! Any failure after profile validation is absorbed: it is logged and the
//! deterministic fallback analysis is returned instead. The only error a caller
//! ever sees is `InvalidProfileError`.

use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tracing::{info, warn};

use crate::analysis::fallback::fallback_analysis;
use crate::analysis::models::{
    AnalysisOutcome, AnalysisSource, InvalidProfileError, PlayerAnalysis, PlayerProfile,
};
use crate::analysis::parser::{parse_analysis, ExtractionError};
use crate::analysis::prompts::build_scouting_prompt;
use crate::config::{AnalysisMode, Config};
use crate::llm_client::{CompletionBackend, CompletionRequest, ModelConfig, ProviderError};

/// Max characters of raw model output kept in failure logs.
const RAW_LOG_LIMIT: usize = 200;

/// Internal failure of the model path. Never leaves this module.
#[derive(Debug, Error)]
enum ModelPathError {
    #[error("provider error: {0}")]
    Provider(#[from] ProviderError),

    #[error("unusable model output: {source}")]
    Response {
        source: ExtractionError,
        raw: String,
    },
}

/// The analysis entry point. Cheap to clone; shared across requests.
#[derive(Clone)]
pub struct Analyzer {
    backend: Arc<dyn CompletionBackend>,
    model: ModelConfig,
    timeout: Duration,
    mode: AnalysisMode,
}

impl Analyzer {
    pub fn new(
        backend: Arc<dyn CompletionBackend>,
        model: ModelConfig,
        timeout: Duration,
        mode: AnalysisMode,
    ) -> Self {
        Self {
            backend,
            model,
            timeout,
            mode,
        }
    }

    pub fn from_config(backend: Arc<dyn CompletionBackend>, config: &Config) -> Self {
        Self::new(
            backend,
            ModelConfig::from(&config.llm),
            config.llm.timeout,
            config.analysis_mode,
        )
    }

    pub fn backend(&self) -> &dyn CompletionBackend {
        self.backend.as_ref()
    }

    pub fn mode(&self) -> AnalysisMode {
        self.mode
    }

    /// Produces an analysis for the profile. Always succeeds for a valid profile.
    pub async fn analyze(
        &self,
        profile: &PlayerProfile,
    ) -> Result<AnalysisOutcome, InvalidProfileError> {
        profile.validate()?;
        let who = profile.display_name().unwrap_or("anonymous");

        if self.mode == AnalysisMode::Fallback {
            info!("Fallback mode: heuristic analysis for {who}");
            return Ok(fallback_outcome(profile));
        }

        info!(
            "Requesting {} analysis for {who} (model: {})",
            self.backend.name(),
            self.model.model
        );

        match self.analyze_with_model(profile).await {
            Ok(analysis) => {
                info!(
                    "Model analysis for {who}: scores={:?}",
                    analysis.scores()
                );
                Ok(AnalysisOutcome {
                    analysis,
                    source: AnalysisSource::Model,
                })
            }
            Err(ModelPathError::Provider(e)) => {
                warn!("Completion failed for {who}, using fallback analysis: {e}");
                Ok(fallback_outcome(profile))
            }
            Err(ModelPathError::Response { source, raw }) => {
                warn!(
                    "Model output rejected for {who} ({source}), using fallback analysis. Raw: {:?}",
                    truncate_chars(&raw, RAW_LOG_LIMIT)
                );
                Ok(fallback_outcome(profile))
            }
        }
    }

    async fn analyze_with_model(
        &self,
        profile: &PlayerProfile,
    ) -> Result<PlayerAnalysis, ModelPathError> {
        let prompt = build_scouting_prompt(profile);
        let request = CompletionRequest {
            system: &prompt.system,
            user: &prompt.user,
            model: &self.model,
        };

        let raw = tokio::time::timeout(self.timeout, self.backend.complete(request))
            .await
            .map_err(|_| ProviderError::Timeout(self.timeout.as_secs()))??;

        parse_analysis(&raw, profile).map_err(|source| ModelPathError::Response { source, raw })
    }
}

fn fallback_outcome(profile: &PlayerProfile) -> AnalysisOutcome {
    AnalysisOutcome {
        analysis: fallback_analysis(profile),
        source: AnalysisSource::Fallback,
    }
}

/// Char-boundary-safe prefix for log lines.
fn truncate_chars(text: &str, max: usize) -> &str {
    match text.char_indices().nth(max) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}
