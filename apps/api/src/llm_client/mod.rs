/// LLM Client: the single point of entry for all completion calls in FootPulse.
///
/// ARCHITECTURAL RULE: No other module may call the completion API directly.
/// All LLM interactions MUST go through a `CompletionBackend`.
///
/// The default backend speaks the OpenAI-compatible chat completions protocol
/// (Groq). It is built once by the process bootstrap and injected as
/// `Arc<dyn CompletionBackend>`.
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::config::LlmConfig;

pub mod prompts;

/// Failure of the completion backend. Recovered by the analyzer's fallback path.
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("Completion timed out after {0}s")]
    Timeout(u64),

    #[error("LLM returned empty content")]
    EmptyContent,

    #[error("Completion backend is not configured")]
    NotConfigured,
}

/// Per-call model settings.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelConfig {
    pub model: String,
    /// 0.0 – 1.0, low values favour consistent scoring.
    pub temperature: f32,
    pub max_tokens: u32,
}

impl From<&LlmConfig> for ModelConfig {
    fn from(config: &LlmConfig) -> Self {
        Self {
            model: config.model.clone(),
            temperature: config.temperature,
            max_tokens: config.max_tokens,
        }
    }
}

/// A rendered prompt pair ready for the backend.
#[derive(Debug, Clone)]
pub struct CompletionRequest<'a> {
    pub system: &'a str,
    pub user: &'a str,
    pub model: &'a ModelConfig,
}

/// A text-completion capability. Implement this to swap providers without
/// touching the analyzer or the handlers.
#[async_trait]
pub trait CompletionBackend: Send + Sync {
    /// Returns the raw completion text. Exactly one attempt is made.
    async fn complete(&self, request: CompletionRequest<'_>) -> Result<String, ProviderError>;

    /// Cheap round-trip used by the system status endpoint.
    async fn ping(&self) -> Result<(), ProviderError>;

    /// Short name surfaced in logs and status responses.
    fn name(&self) -> &'static str;
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
pub struct ChatResponse {
    pub choices: Vec<Choice>,
    pub usage: Option<Usage>,
}

#[derive(Debug, Deserialize)]
pub struct Choice {
    pub message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
pub struct ChoiceMessage {
    pub content: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct Usage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
}

impl ChatResponse {
    /// Text of the first choice, if it carries any non-blank content.
    pub fn text(&self) -> Option<&str> {
        self.choices
            .first()
            .and_then(|c| c.message.content.as_deref())
            .filter(|t| !t.trim().is_empty())
    }
}

#[derive(Debug, Deserialize)]
struct ApiErrorEnvelope {
    error: ApiErrorBody,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    message: String,
}

/// OpenAI-compatible chat completions client (Groq by default).
#[derive(Clone)]
pub struct GroqClient {
    client: Client,
    base_url: String,
    api_key: String,
    /// Model used by the connection check.
    ping_model: String,
}

impl GroqClient {
    /// `timeout` bounds every request made by this client, pings included.
    pub fn new(
        base_url: String,
        api_key: String,
        ping_model: String,
        timeout: Duration,
    ) -> Result<Self, ProviderError> {
        Ok(Self {
            client: Client::builder().timeout(timeout).build()?,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
            ping_model,
        })
    }

    fn completions_url(&self) -> String {
        format!("{}/chat/completions", self.base_url)
    }

    fn ping_request(&self) -> ChatRequest<'_> {
        ChatRequest {
            model: &self.ping_model,
            messages: vec![ChatMessage {
                role: "user",
                content: prompts::PING_PROMPT,
            }],
            temperature: 0.0,
            max_tokens: 10,
        }
    }

    async fn send(&self, body: &ChatRequest<'_>) -> Result<ChatResponse, ProviderError> {
        let response = self
            .client
            .post(self.completions_url())
            .bearer_auth(&self.api_key)
            .json(body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ApiErrorEnvelope>(&body)
                .map(|e| e.error.message)
                .unwrap_or(body);
            return Err(ProviderError::Api {
                status: status.as_u16(),
                message,
            });
        }

        Ok(response.json().await?)
    }
}

#[async_trait]
impl CompletionBackend for GroqClient {
    async fn complete(&self, request: CompletionRequest<'_>) -> Result<String, ProviderError> {
        let body = ChatRequest {
            model: &request.model.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: request.system,
                },
                ChatMessage {
                    role: "user",
                    content: request.user,
                },
            ],
            temperature: request.model.temperature,
            max_tokens: request.model.max_tokens,
        };

        let response = self.send(&body).await?;

        if let Some(usage) = &response.usage {
            debug!(
                "LLM call succeeded: prompt_tokens={}, completion_tokens={}",
                usage.prompt_tokens, usage.completion_tokens
            );
        }

        response
            .text()
            .map(str::to_string)
            .ok_or(ProviderError::EmptyContent)
    }

    async fn ping(&self) -> Result<(), ProviderError> {
        self.send(&self.ping_request()).await.map(|_| ())
    }

    fn name(&self) -> &'static str {
        "groq"
    }
}

/// Backend used when the service runs in fallback mode: every call fails fast so
/// the analyzer serves the deterministic heuristic.
pub struct DisabledBackend;

#[async_trait]
impl CompletionBackend for DisabledBackend {
    async fn complete(&self, _request: CompletionRequest<'_>) -> Result<String, ProviderError> {
        Err(ProviderError::NotConfigured)
    }

    async fn ping(&self) -> Result<(), ProviderError> {
        Err(ProviderError::NotConfigured)
    }

    fn name(&self) -> &'static str {
        "disabled"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn groq(base_url: &str, model: &str) -> GroqClient {
        GroqClient::new(
            base_url.to_string(),
            "k".to_string(),
            model.to_string(),
            Duration::from_secs(20),
        )
        .unwrap()
    }

    #[test]
    fn test_chat_response_text_reads_first_choice() {
        let json = r#"{
            "choices": [{"message": {"role": "assistant", "content": "{\"globalScore\": 70}"}}],
            "usage": {"prompt_tokens": 420, "completion_tokens": 180, "total_tokens": 600}
        }"#;
        let response: ChatResponse = serde_json::from_str(json).unwrap();
        assert_eq!(response.text(), Some("{\"globalScore\": 70}"));
        assert_eq!(response.usage.unwrap().completion_tokens, 180);
    }

    #[test]
    fn test_chat_response_blank_content_is_none() {
        let json = r#"{"choices": [{"message": {"content": "   "}}]}"#;
        let response: ChatResponse = serde_json::from_str(json).unwrap();
        assert!(response.text().is_none());
    }

    #[test]
    fn test_chat_response_without_choices_is_none() {
        let response: ChatResponse = serde_json::from_str(r#"{"choices": []}"#).unwrap();
        assert!(response.text().is_none());
    }

    #[test]
    fn test_chat_request_serializes_roles_in_order() {
        let body = ChatRequest {
            model: "llama-3.1-70b-versatile",
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: "rubric",
                },
                ChatMessage {
                    role: "user",
                    content: "profile",
                },
            ],
            temperature: 0.3,
            max_tokens: 1500,
        };
        let value = serde_json::to_value(&body).unwrap();
        assert_eq!(value["messages"][0]["role"], "system");
        assert_eq!(value["messages"][1]["content"], "profile");
        assert_eq!(value["max_tokens"], 1500);
    }

    #[test]
    fn test_completions_url_trims_trailing_slash() {
        let client = groq("https://api.groq.com/openai/v1/", "llama-3.1-70b-versatile");
        assert_eq!(
            client.completions_url(),
            "https://api.groq.com/openai/v1/chat/completions"
        );
    }

    #[test]
    fn test_ping_uses_configured_model() {
        let client = groq("https://llm.internal.example/v1", "mistral-small-latest");
        let value = serde_json::to_value(client.ping_request()).unwrap();
        assert_eq!(value["model"], "mistral-small-latest");
        assert_eq!(value["messages"][0]["content"], prompts::PING_PROMPT);
    }

    #[tokio::test]
    async fn test_silent_server_hits_client_timeout() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        // Accept and hold connections without ever answering.
        let server = tokio::spawn(async move {
            let mut held = Vec::new();
            while let Ok((socket, _)) = listener.accept().await {
                held.push(socket);
            }
        });

        let client = GroqClient::new(
            format!("http://{addr}"),
            "key".to_string(),
            "llama-3.1-70b-versatile".to_string(),
            Duration::from_millis(200),
        )
        .unwrap();

        let result = tokio::time::timeout(Duration::from_secs(10), client.ping())
            .await
            .expect("client timeout must fire first");
        match result {
            Err(ProviderError::Http(e)) => assert!(e.is_timeout()),
            other => panic!("expected HTTP timeout, got {other:?}"),
        }
        server.abort();
    }

    #[tokio::test]
    async fn test_disabled_backend_always_fails() {
        let model = ModelConfig {
            model: "m".to_string(),
            temperature: 0.3,
            max_tokens: 10,
        };
        let result = DisabledBackend
            .complete(CompletionRequest {
                system: "s",
                user: "u",
                model: &model,
            })
            .await;
        assert!(matches!(result, Err(ProviderError::NotConfigured)));
    }
}
