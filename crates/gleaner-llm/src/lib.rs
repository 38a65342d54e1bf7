//! Gleaner LLM Provider Layer
//!
//! Pluggable model-client implementations of the `ModelClient` trait from
//! `gleaner-domain`.
//!
//! # Providers
//!
//! - `MockProvider`: Scripted mock for testing
//! - `OllamaProvider`: Local Ollama chat API integration
//!
//! # Examples
//!
//! ```
//! use gleaner_llm::MockProvider;
//! use gleaner_domain::{ModelClient, ModelRequest, ModelResponse, ResponseKind};
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let provider = MockProvider::new().with_default(ResponseKind::Text, "Hello from LLM!");
//! let response = provider
//!     .send(ModelRequest::new("test prompt", ResponseKind::Text))
//!     .await
//!     .unwrap();
//! assert_eq!(response, ModelResponse::Text("Hello from LLM!".to_string()));
//! # }
//! ```

#![warn(missing_docs)]

pub mod decode;
pub mod ollama;

use async_trait::async_trait;
use gleaner_domain::{ModelClient, ModelError, ModelRequest, ModelResponse, ResponseKind};
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

pub use decode::decode_response;
pub use ollama::{OllamaConfig, OllamaProvider};

/// A scripted reply: raw model output or a failure
#[derive(Debug, Clone)]
enum MockReply {
    Raw(String),
    Error(ModelError),
}

/// Reply used whenever the prompt contains `needle`
#[derive(Debug, Clone)]
struct MockRule {
    needle: String,
    kind: ResponseKind,
    reply: MockReply,
}

#[derive(Debug, Default)]
struct MockState {
    defaults: HashMap<ResponseKind, MockReply>,
    queues: HashMap<ResponseKind, VecDeque<MockReply>>,
    rules: Vec<MockRule>,
    delay: Option<Duration>,
    requests: Vec<ModelRequest>,
}

/// Mock model provider for deterministic testing
///
/// Replies are raw strings decoded exactly like a real provider's output, so
/// malformed JSON surfaces as a decode error. Resolution order per request:
/// prompt rules (first match), then the queue for the requested kind, then the
/// default for the kind.
///
/// Clones share state, so a test can keep a handle for assertions after moving
/// the provider into an extractor.
///
/// # Examples
///
/// ```
/// use gleaner_llm::MockProvider;
/// use gleaner_domain::{ModelClient, ModelRequest, ResponseKind};
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let provider = MockProvider::new()
///     .push_response(ResponseKind::GleaningStatus, r#"{"status": "continue"}"#);
///
/// provider.send(ModelRequest::new("done?", ResponseKind::GleaningStatus)).await.unwrap();
/// assert_eq!(provider.call_count(), 1);
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct MockProvider {
    state: Arc<Mutex<MockState>>,
}

impl MockProvider {
    /// Create a provider that returns an empty graph, `done`, and empty text
    pub fn new() -> Self {
        let provider = Self {
            state: Arc::new(Mutex::new(MockState::default())),
        };
        provider
            .with_default(ResponseKind::Text, "")
            .with_default(ResponseKind::Graph, r#"{"entities": [], "relationships": []}"#)
            .with_default(ResponseKind::GleaningStatus, r#"{"status": "done"}"#)
    }

    /// Create a provider whose default graph reply is `graph_json`
    pub fn with_graph(graph_json: impl Into<String>) -> Self {
        Self::new().with_default(ResponseKind::Graph, graph_json)
    }

    /// Set the fallback reply for a kind
    pub fn with_default(self, kind: ResponseKind, raw: impl Into<String>) -> Self {
        self.state().defaults.insert(kind, MockReply::Raw(raw.into()));
        self
    }

    /// Make every request of a kind fail unless a rule or queued reply applies
    pub fn with_default_error(self, kind: ResponseKind, error: ModelError) -> Self {
        self.state().defaults.insert(kind, MockReply::Error(error));
        self
    }

    /// Queue a one-shot reply for a kind
    pub fn push_response(self, kind: ResponseKind, raw: impl Into<String>) -> Self {
        self.state()
            .queues
            .entry(kind)
            .or_default()
            .push_back(MockReply::Raw(raw.into()));
        self
    }

    /// Queue a one-shot failure for a kind
    pub fn push_error(self, kind: ResponseKind, error: ModelError) -> Self {
        self.state()
            .queues
            .entry(kind)
            .or_default()
            .push_back(MockReply::Error(error));
        self
    }

    /// Reply with `raw` whenever a request of `kind` has a prompt containing `needle`
    pub fn respond_when_prompt_contains(
        self,
        needle: impl Into<String>,
        kind: ResponseKind,
        raw: impl Into<String>,
    ) -> Self {
        self.state().rules.push(MockRule {
            needle: needle.into(),
            kind,
            reply: MockReply::Raw(raw.into()),
        });
        self
    }

    /// Fail whenever a request of `kind` has a prompt containing `needle`
    pub fn fail_when_prompt_contains(
        self,
        needle: impl Into<String>,
        kind: ResponseKind,
        error: ModelError,
    ) -> Self {
        self.state().rules.push(MockRule {
            needle: needle.into(),
            kind,
            reply: MockReply::Error(error),
        });
        self
    }

    /// Sleep this long before answering each request
    pub fn with_delay(self, delay: Duration) -> Self {
        self.state().delay = Some(delay);
        self
    }

    /// Get the number of requests received
    pub fn call_count(&self) -> usize {
        self.state().requests.len()
    }

    /// Number of requests received for one kind
    pub fn calls_for(&self, kind: ResponseKind) -> usize {
        self.state()
            .requests
            .iter()
            .filter(|request| request.kind == kind)
            .count()
    }

    /// Every request received, in arrival order
    pub fn requests(&self) -> Vec<ModelRequest> {
        self.state().requests.clone()
    }

    fn state(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn next_reply(&self, request: &ModelRequest) -> (MockReply, Option<Duration>) {
        let mut state = self.state();
        state.requests.push(request.clone());

        let delay = state.delay;
        let rule = state
            .rules
            .iter()
            .find(|rule| rule.kind == request.kind && request.prompt.contains(&rule.needle))
            .map(|rule| rule.reply.clone());
        if let Some(reply) = rule {
            return (reply, delay);
        }

        if let Some(reply) = state
            .queues
            .get_mut(&request.kind)
            .and_then(VecDeque::pop_front)
        {
            return (reply, delay);
        }

        let reply = state
            .defaults
            .get(&request.kind)
            .cloned()
            .unwrap_or_else(|| {
                MockReply::Error(ModelError::Invocation(format!(
                    "No mock reply configured for {:?}",
                    request.kind
                )))
            });
        (reply, delay)
    }
}

impl Default for MockProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ModelClient for MockProvider {
    async fn send(&self, request: ModelRequest) -> Result<ModelResponse, ModelError> {
        let (reply, delay) = self.next_reply(&request);

        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        match reply {
            MockReply::Raw(raw) => decode_response(request.kind, &raw),
            MockReply::Error(error) => Err(error),
        }
    }
}
