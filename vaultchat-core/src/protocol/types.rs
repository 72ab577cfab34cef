//! Core protocol types for chat interactions
//!
//! This module contains the uniform structures exchanged between callers and
//! provider adapters. Every adapter translates a [`ChatRequest`] into its own
//! wire dialect and normalizes the answer back into a [`ChatResponse`] or a
//! sequence of [`TokenDelta`]s.

use serde::{Deserialize, Serialize};

/// Role of a message in the conversation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    /// System instructions that guide the model's behavior
    System,
    /// User input message
    User,
    /// Assistant (model) response
    Assistant,
}

impl MessageRole {
    /// Wire name used by OpenAI-style and Ollama APIs
    pub fn as_str(&self) -> &'static str {
        match self {
            MessageRole::System => "system",
            MessageRole::User => "user",
            MessageRole::Assistant => "assistant",
        }
    }
}

/// A message in the conversation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    /// Role of the message sender
    pub role: MessageRole,

    /// Text content of the message
    pub content: String,
}

/// Chat completion request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct ChatRequest {
    /// Model identifier to use
    #[serde(default)]
    pub model: String,

    /// Messages in conversation order
    #[serde(default)]
    pub messages: Vec<Message>,

    /// Maximum tokens to generate
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,

    /// Sampling temperature (range is provider-defined)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,

    /// Streaming hint; adapters set the wire flag themselves
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stream: Option<bool>,
}

/// Complete chat response
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatResponse {
    /// Full generated text
    pub text: String,

    /// Token usage information, when the provider reports it
    #[serde(skip_serializing_if = "Option::is_none")]
    pub usage: Option<CompletionUsage>,
}

impl ChatResponse {
    /// A response without usage figures
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            usage: None,
        }
    }

    /// Attach usage figures
    pub fn with_usage(mut self, usage: CompletionUsage) -> Self {
        self.usage = Some(usage);
        self
    }
}

/// Token usage information
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompletionUsage {
    /// Tokens in the prompt
    pub prompt_tokens: u32,

    /// Tokens in the completion
    pub completion_tokens: u32,

    /// Total tokens used
    pub total_tokens: u32,
}

impl CompletionUsage {
    /// Build usage from prompt and completion counts
    pub fn new(prompt_tokens: u32, completion_tokens: u32) -> Self {
        Self {
            prompt_tokens,
            completion_tokens,
            total_tokens: prompt_tokens.saturating_add(completion_tokens),
        }
    }
}

/// One increment of a streamed response
///
/// A stream ends with exactly one delta whose `done` flag is set; no deltas
/// follow it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenDelta {
    /// Incremental text fragment
    pub content: String,

    /// Whether this is the terminal delta
    pub done: bool,
}

impl TokenDelta {
    /// A content-bearing, non-terminal delta
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            done: false,
        }
    }

    /// The terminal delta
    pub fn done() -> Self {
        Self {
            content: String::new(),
            done: true,
        }
    }
}

/// A selectable model exposed by a provider
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelInfo {
    /// Model identifier, unique within one provider
    pub id: String,

    /// Human-readable name
    pub name: String,

    /// Context window in tokens, when known
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context_length: Option<u32>,

    /// Whether the model can stream
    pub supports_streaming: bool,
}

impl ModelInfo {
    /// Create a streaming-capable model entry with unknown context length
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            context_length: None,
            supports_streaming: true,
        }
    }

    /// Set the context length
    pub fn with_context_length(mut self, context_length: u32) -> Self {
        self.context_length = Some(context_length);
        self
    }
}

/// Outcome of a provider connectivity check
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationResult {
    /// Whether the provider is reachable with the configured credentials
    pub valid: bool,

    /// Human-readable reason when `valid` is false
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ValidationResult {
    /// A successful check
    pub fn ok() -> Self {
        Self {
            valid: true,
            error: None,
        }
    }

    /// A failed check with a reason
    pub fn failed(error: impl Into<String>) -> Self {
        let error = error.into();
        let error = if error.trim().is_empty() {
            "Unknown error".to_string()
        } else {
            error
        };
        Self {
            valid: false,
            error: Some(error),
        }
    }
}

// ============================================================================
// Convenience traits and constructors
// ============================================================================

/// Trait for converting types into messages
pub trait IntoMessage {
    /// Convert self into a Message
    fn into_message(self) -> Message;
}

impl IntoMessage for Message {
    fn into_message(self) -> Message {
        self
    }
}

impl IntoMessage for String {
    fn into_message(self) -> Message {
        Message::user(self)
    }
}

impl IntoMessage for &str {
    fn into_message(self) -> Message {
        Message::user(self)
    }
}

impl Message {
    /// Create a message with an explicit role
    pub fn new(role: MessageRole, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }

    /// Create a system message
    pub fn system(content: impl Into<String>) -> Self {
        Self::new(MessageRole::System, content)
    }

    /// Create a user message
    pub fn user(content: impl Into<String>) -> Self {
        Self::new(MessageRole::User, content)
    }

    /// Create an assistant message
    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(MessageRole::Assistant, content)
    }
}

impl ChatRequest {
    /// Create a new chat request with model and messages
    pub fn new<M: IntoMessage>(model: impl Into<String>, messages: Vec<M>) -> Self {
        Self {
            model: model.into(),
            messages: messages.into_iter().map(IntoMessage::into_message).collect(),
            max_tokens: None,
            temperature: None,
            stream: None,
        }
    }

    /// Enable streaming
    pub fn with_streaming(mut self) -> Self {
        self.stream = Some(true);
        self
    }

    /// Set temperature
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    /// Set max tokens
    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    /// Append a message
    pub fn with_message(mut self, message: impl IntoMessage) -> Self {
        self.messages.push(message.into_message());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_builder() {
        let request = ChatRequest::new("m", vec![Message::system("be brief")])
            .with_message("hello")
            .with_max_tokens(64)
            .with_temperature(0.3);

        assert_eq!(request.messages.len(), 2);
        assert_eq!(request.messages[1].role, MessageRole::User);
        assert_eq!(request.max_tokens, Some(64));
        assert_eq!(request.temperature, Some(0.3));
        assert_eq!(request.stream, None);
    }

    #[test]
    fn test_role_serialization() {
        let json = serde_json::to_string(&Message::assistant("hi")).unwrap();
        assert_eq!(json, r#"{"role":"assistant","content":"hi"}"#);
    }

    #[test]
    fn test_failed_validation_always_has_error() {
        let result = ValidationResult::failed("  ");
        assert!(!result.valid);
        assert_eq!(result.error.as_deref(), Some("Unknown error"));
    }

    #[test]
    fn test_usage_total() {
        let usage = CompletionUsage::new(12, 30);
        assert_eq!(usage.total_tokens, 42);

        let huge = CompletionUsage::new(u32::MAX, 5);
        assert_eq!(huge.total_tokens, u32::MAX);
    }
}
