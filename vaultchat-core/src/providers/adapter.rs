//! Provider adapter trait
//!
//! Every backend (OpenRouter, MiniMax, Ollama, OpenAI-compatible servers,
//! Gemini) implements [`Provider`]. Adapters own their transport settings and
//! translate the uniform [`ChatRequest`] into their own wire dialect.

use crate::protocol::{ChatRequest, ChatResponse, ModelInfo, ValidationResult};
use crate::providers::error::{ProviderError, ProviderResult};
use crate::stream::TokenStream;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Core provider trait that all LLM backends implement
///
/// Adapters are shared across tasks behind `Arc<dyn Provider>`; calls on one
/// adapter may run concurrently and do not share mutable state.
#[async_trait]
pub trait Provider: Send + Sync {
    /// Registry key of this instance
    fn id(&self) -> &str;

    /// Name shown to the user
    fn display_name(&self) -> &str;

    /// Model used when a request leaves `model` empty
    fn default_model(&self) -> Option<&str> {
        None
    }

    /// Check configuration and connectivity
    ///
    /// Never fails; problems are reported through the result's `error`.
    async fn validate(&self) -> ValidationResult;

    /// Models the user can pick from
    ///
    /// Never fails; falls back to a static list (or an empty one) when the
    /// listing endpoint is unreachable.
    async fn list_models(&self) -> Vec<ModelInfo>;

    /// Blocking chat completion
    async fn chat(&self, request: ChatRequest) -> ProviderResult<ChatResponse>;

    /// Streaming chat completion
    ///
    /// Resolves once the provider has accepted the request; text then arrives
    /// through the returned stream.
    async fn chat_stream(&self, request: ChatRequest) -> ProviderResult<TokenStream>;
}

/// What a successful response with no text means
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmptyResponsePolicy {
    /// Return the empty text as a normal answer
    #[default]
    Allow,
    /// Raise [`ProviderError::EmptyResponse`]
    Reject,
}

impl EmptyResponsePolicy {
    /// Apply the policy to a finished response
    pub fn check(self, response: ChatResponse) -> ProviderResult<ChatResponse> {
        match self {
            EmptyResponsePolicy::Reject if response.text.trim().is_empty() => {
                Err(ProviderError::EmptyResponse)
            }
            _ => Ok(response),
        }
    }
}

/// Pick the model for a call
///
/// The request's model wins, then the instance setting, then the adapter's
/// built-in default.
pub fn resolve_model(
    requested: &str,
    configured: Option<&str>,
    fallback: Option<&str>,
) -> ProviderResult<String> {
    let requested = requested.trim();
    if !requested.is_empty() {
        return Ok(requested.to_string());
    }

    configured
        .map(str::trim)
        .filter(|m| !m.is_empty())
        .or(fallback)
        .map(str::to_string)
        .ok_or_else(|| ProviderError::Configuration("No model selected".to_string()))
}

/// Fail before any network call when a required key is missing
pub fn require_key<'a>(provider: &str, key: &'a str) -> ProviderResult<&'a str> {
    let key = key.trim();
    if key.is_empty() {
        Err(ProviderError::Configuration(format!(
            "{} API key is not configured",
            provider
        )))
    } else {
        Ok(key)
    }
}

/// Turn the outcome of a validation probe into a user-facing result
///
/// Each failure class gets its own wording so the settings screen can tell
/// a bad key from an unreachable server.
pub fn validation_outcome(provider: &str, outcome: ProviderResult<()>) -> ValidationResult {
    match outcome {
        Ok(()) => ValidationResult::ok(),
        Err(ProviderError::Configuration(message)) => ValidationResult::failed(message),
        Err(ProviderError::Authentication(detail)) => {
            ValidationResult::failed(format!("Invalid {} API key: {}", provider, detail))
        }
        Err(ProviderError::Network(detail)) => {
            ValidationResult::failed(format!("Cannot connect to {}: {}", provider, detail))
        }
        Err(ProviderError::Timeout) => {
            ValidationResult::failed(format!("Connection to {} timed out", provider))
        }
        Err(other) => ValidationResult::failed(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reject_policy() {
        let empty = ChatResponse::new("  \n");
        assert_eq!(
            EmptyResponsePolicy::Reject.check(empty.clone()),
            Err(ProviderError::EmptyResponse)
        );
        assert_eq!(EmptyResponsePolicy::Allow.check(empty.clone()), Ok(empty));
        assert!(EmptyResponsePolicy::Reject
            .check(ChatResponse::new("hi"))
            .is_ok());
    }

    #[test]
    fn test_resolve_model_precedence() {
        assert_eq!(resolve_model("a", Some("b"), Some("c")).unwrap(), "a");
        assert_eq!(resolve_model("", Some("b"), Some("c")).unwrap(), "b");
        assert_eq!(resolve_model(" ", Some(""), Some("c")).unwrap(), "c");
        assert!(matches!(
            resolve_model("", None, None),
            Err(ProviderError::Configuration(_))
        ));
    }

    #[test]
    fn test_require_key() {
        assert_eq!(require_key("Gemini", " k ").unwrap(), "k");
        assert_eq!(
            require_key("Gemini", ""),
            Err(ProviderError::Configuration(
                "Gemini API key is not configured".to_string()
            ))
        );
    }

    #[test]
    fn test_validation_wording_is_distinct() {
        let auth = validation_outcome("OpenRouter", Err(ProviderError::Authentication("401".into())));
        let net = validation_outcome("OpenRouter", Err(ProviderError::Network("refused".into())));
        let cfg = validation_outcome(
            "OpenRouter",
            Err(ProviderError::Configuration("OpenRouter API key is not configured".into())),
        );
        assert!(!auth.valid && !net.valid && !cfg.valid);
        assert_ne!(auth.error, net.error);
        assert_ne!(auth.error, cfg.error);
        assert!(auth.error.unwrap().contains("Invalid OpenRouter API key"));
        assert_eq!(validation_outcome("x", Ok(())), ValidationResult::ok());
    }
}
