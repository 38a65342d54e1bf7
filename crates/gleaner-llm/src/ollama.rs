//! Ollama Provider Implementation
//!
//! Provides integration with Ollama's local chat API.
//!
//! # Features
//!
//! - Async HTTP communication with the Ollama `/api/chat` endpoint
//! - Conversation history forwarded as chat messages
//! - JSON mode for structured response kinds
//! - Retry logic with exponential backoff
//! - Timeout handling
//!
//! # Examples
//!
//! ```no_run
//! use gleaner_llm::OllamaProvider;
//!
//! let provider = OllamaProvider::new("http://localhost:11434", "llama3");
//! ```

use crate::decode::decode_response;
use async_trait::async_trait;
use gleaner_domain::{
    Message, ModelClient, ModelError, ModelRequest, ModelResponse, ResponseKind, Role,
};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, warn};

/// Default Ollama API endpoint
pub const DEFAULT_ENDPOINT: &str = "http://localhost:11434";

/// Default model name
pub const DEFAULT_MODEL: &str = "llama3";

/// Default timeout for LLM requests (120 seconds)
pub const DEFAULT_TIMEOUT_SECS: u64 = 120;

/// Default number of retry attempts
pub const DEFAULT_MAX_RETRIES: u32 = 3;

/// Backoff stops doubling after this many retries (64 seconds)
const MAX_BACKOFF_EXPONENT: u32 = 6;

/// Connection settings for [`OllamaProvider`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OllamaConfig {
    /// API endpoint
    #[serde(default = "default_endpoint")]
    pub endpoint: String,

    /// Model name
    #[serde(default = "default_model")]
    pub model: String,

    /// Per-request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Attempts per request before giving up
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
}

fn default_endpoint() -> String {
    DEFAULT_ENDPOINT.to_string()
}

fn default_model() -> String {
    DEFAULT_MODEL.to_string()
}

fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

fn default_max_retries() -> u32 {
    DEFAULT_MAX_RETRIES
}

impl Default for OllamaConfig {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            model: default_model(),
            timeout_secs: default_timeout_secs(),
            max_retries: default_max_retries(),
        }
    }
}

/// Ollama API provider for local LLM inference
pub struct OllamaProvider {
    endpoint: String,
    model: String,
    client: reqwest::Client,
    max_retries: u32,
}

/// One chat message in Ollama's wire format
#[derive(Debug, Serialize, Deserialize, PartialEq)]
struct ChatMessage {
    role: String,
    content: String,
}

/// Request body for Ollama chat API
#[derive(Debug, Serialize)]
struct OllamaChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    stream: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    format: Option<&'static str>,
    options: OllamaOptions,
}

#[derive(Debug, Serialize)]
struct OllamaOptions {
    temperature: f32,
}

/// Response from Ollama chat API
#[derive(Deserialize)]
struct OllamaChatResponse {
    message: ChatMessage,
    #[allow(dead_code)]
    done: bool,
}

impl OllamaProvider {
    /// Create a new Ollama provider
    ///
    /// # Parameters
    ///
    /// - `endpoint`: Ollama API endpoint (e.g., "http://localhost:11434")
    /// - `model`: Model to use (e.g., "llama3", "mistral")
    pub fn new(endpoint: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            model: model.into(),
            client: build_client(Duration::from_secs(DEFAULT_TIMEOUT_SECS)),
            max_retries: DEFAULT_MAX_RETRIES,
        }
    }

    /// Create a new Ollama provider with the default endpoint
    pub fn default_endpoint(model: impl Into<String>) -> Self {
        Self::new(DEFAULT_ENDPOINT, model)
    }

    /// Create a provider from configuration
    pub fn from_config(config: &OllamaConfig) -> Self {
        Self::new(config.endpoint.clone(), config.model.clone())
            .with_timeout(Duration::from_secs(config.timeout_secs))
            .with_max_retries(config.max_retries)
    }

    /// Set the maximum number of retry attempts
    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries.max(1);
        self
    }

    /// Set the per-request timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.client = build_client(timeout);
        self
    }

    fn build_request(&self, request: &ModelRequest) -> OllamaChatRequest {
        let mut messages: Vec<ChatMessage> = request.history.iter().map(to_chat_message).collect();
        messages.push(ChatMessage {
            role: "user".to_string(),
            content: request.prompt.clone(),
        });

        let format = match request.kind {
            ResponseKind::Text => None,
            ResponseKind::Graph | ResponseKind::GleaningStatus => Some("json"),
        };

        OllamaChatRequest {
            model: self.model.clone(),
            messages,
            stream: false,
            format,
            options: OllamaOptions { temperature: 0.0 },
        }
    }

    /// Send a chat request and return the raw reply text
    ///
    /// # Errors
    ///
    /// Returns error if:
    /// - Ollama is not running
    /// - Model is not available
    /// - Network communication fails after all retries
    /// - Response envelope is invalid
    pub async fn chat(&self, request: &ModelRequest) -> Result<String, ModelError> {
        let url = format!("{}/api/chat", self.endpoint);
        let body = self.build_request(request);

        // Retry logic with exponential backoff
        let mut attempts = 0;
        let mut last_error = None;

        while attempts < self.max_retries {
            match self.client.post(&url).json(&body).send().await {
                Ok(response) => {
                    let status = response.status();
                    if status.is_success() {
                        return response
                            .json::<OllamaChatResponse>()
                            .await
                            .map(|reply| reply.message.content)
                            .map_err(|e| {
                                ModelError::Invocation(format!("Failed to parse response: {}", e))
                            });
                    }
                    if status == reqwest::StatusCode::NOT_FOUND {
                        return Err(ModelError::ModelNotAvailable(self.model.clone()));
                    }
                    if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
                        last_error = Some(ModelError::RateLimitExceeded);
                    } else {
                        let error_text = response
                            .text()
                            .await
                            .unwrap_or_else(|_| "Unknown error".to_string());
                        last_error = Some(ModelError::Invocation(format!(
                            "HTTP {}: {}",
                            status, error_text
                        )));
                    }
                }
                Err(e) => {
                    last_error = Some(ModelError::Invocation(format!("Request failed: {}", e)));
                }
            }

            attempts += 1;
            if attempts < self.max_retries {
                let delay = backoff_delay(attempts);
                warn!(attempt = attempts, ?delay, "Ollama request failed, retrying");
                tokio::time::sleep(delay).await;
            }
        }

        Err(last_error
            .unwrap_or_else(|| ModelError::Invocation("Max retries exceeded".to_string())))
    }
}

#[async_trait]
impl ModelClient for OllamaProvider {
    async fn send(&self, request: ModelRequest) -> Result<ModelResponse, ModelError> {
        debug!(
            kind = ?request.kind,
            history = request.history.len(),
            prompt_len = request.prompt.len(),
            "Sending Ollama chat request"
        );
        let raw = self.chat(&request).await?;
        decode_response(request.kind, &raw)
    }
}

/// Exponential backoff: 1s, 2s, 4s, etc., capped at 64s
fn backoff_delay(attempt: u32) -> Duration {
    let exponent = attempt.saturating_sub(1).min(MAX_BACKOFF_EXPONENT);
    Duration::from_secs(1u64 << exponent)
}

fn build_client(timeout: Duration) -> reqwest::Client {
    reqwest::Client::builder()
        .timeout(timeout)
        .build()
        .unwrap_or_else(|_| reqwest::Client::new())
}

fn to_chat_message(message: &Message) -> ChatMessage {
    let role = match message.role {
        Role::User => "user",
        Role::Model => "assistant",
    };
    ChatMessage {
        role: role.to_string(),
        content: message.content.clone(),
    }
}
