//! Trait definitions for external interactions
//!
//! These traits define the boundaries between the extraction pipeline and its
//! collaborators. Implementations live in other crates.

use crate::graph::{GleaningStatus, Graph};
use crate::prompt::PromptArgs;
use async_trait::async_trait;
use thiserror::Error;

/// Shape of the response requested from the model
///
/// Each kind selects a fixed decode path in the model client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResponseKind {
    /// Plain text
    Text,
    /// JSON matching [`Graph`]
    Graph,
    /// JSON matching [`GleaningStatus`]
    GleaningStatus,
}

/// A decoded model response; the variant matches the requested [`ResponseKind`]
#[derive(Debug, Clone, PartialEq)]
pub enum ModelResponse {
    /// Plain text reply
    Text(String),
    /// Structured graph reply
    Graph(Graph),
    /// Structured gleaning verdict
    GleaningStatus(GleaningStatus),
}

impl ModelResponse {
    /// The kind of this response
    pub fn kind(&self) -> ResponseKind {
        match self {
            ModelResponse::Text(_) => ResponseKind::Text,
            ModelResponse::Graph(_) => ResponseKind::Graph,
            ModelResponse::GleaningStatus(_) => ResponseKind::GleaningStatus,
        }
    }
}

/// Speaker of a conversation turn
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    /// The prompt side
    User,
    /// The model side
    Model,
}

/// One turn of conversation history
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    /// Who produced the turn
    pub role: Role,
    /// Raw turn text
    pub content: String,
}

impl Message {
    /// A user turn
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    /// A model turn
    pub fn model(content: impl Into<String>) -> Self {
        Self {
            role: Role::Model,
            content: content.into(),
        }
    }
}

/// A single model invocation
#[derive(Debug, Clone, PartialEq)]
pub struct ModelRequest {
    /// Fully rendered prompt
    pub prompt: String,

    /// Earlier turns of the same conversation, oldest first
    pub history: Vec<Message>,

    /// Desired response shape
    pub kind: ResponseKind,
}

impl ModelRequest {
    /// Create a request with no history
    pub fn new(prompt: impl Into<String>, kind: ResponseKind) -> Self {
        Self {
            prompt: prompt.into(),
            history: Vec::new(),
            kind,
        }
    }

    /// Attach conversation history
    pub fn with_history(mut self, history: Vec<Message>) -> Self {
        self.history = history;
        self
    }
}

/// Errors returned by a model client
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ModelError {
    /// Network or API communication error
    #[error("Communication error: {0}")]
    Invocation(String),

    /// Rate limit exceeded
    #[error("Rate limit exceeded")]
    RateLimitExceeded,

    /// Model not available
    #[error("Model not available: {0}")]
    ModelNotAvailable(String),

    /// Output did not match the requested shape
    #[error("Failed to decode response: {0}")]
    Decode(String),
}

impl ModelError {
    /// True for shape-mismatch failures, false for transport failures
    pub fn is_decode(&self) -> bool {
        matches!(self, ModelError::Decode(_))
    }
}

/// Trait for language-model invocation
///
/// Implemented by the infrastructure layer (gleaner-llm). Retries, if any,
/// belong to the implementation.
#[async_trait]
pub trait ModelClient: Send + Sync {
    /// Send a prompt and decode the reply into the requested shape
    async fn send(&self, request: ModelRequest) -> Result<ModelResponse, ModelError>;
}

/// Errors returned by a prompt renderer
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RenderError {
    /// No template registered under this name
    #[error("Unknown template: {0}")]
    UnknownTemplate(String),

    /// Template references an argument that was not supplied
    #[error("Template '{template}' references missing argument '{key}'")]
    MissingArgument {
        /// Template name
        template: String,
        /// Missing key
        key: String,
    },

    /// Template text could not be parsed
    #[error("Template '{template}' is malformed: {reason}")]
    Malformed {
        /// Template name
        template: String,
        /// Parse failure
        reason: String,
    },
}

/// Trait for rendering named prompt templates
///
/// Implemented by the application layer (gleaner-extractor)
pub trait PromptRenderer: Send + Sync {
    /// Render `template` with `args`
    fn render(&self, template: &str, args: &PromptArgs) -> Result<String, RenderError>;
}
