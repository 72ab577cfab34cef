//! Adapter for self-hosted servers speaking the OpenAI dialect
//!
//! Covers LM Studio, llama.cpp, vLLM and similar servers. The user supplies a
//! base URL in whatever form they copied it; [`normalize_endpoint`] turns it
//! into the chat-completions URL.

use super::adapter::{resolve_model, validation_outcome, EmptyResponsePolicy, Provider};
use super::error::{ProviderError, ProviderResult};
use super::openai::{auth_headers, OpenAICompatClient};
use crate::config::OpenAiCompatibleSettings;
use crate::http::{HttpClient, HttpSettings};
use crate::protocol::{ChatRequest, ChatResponse, Message, ModelInfo, ValidationResult};
use crate::stream::TokenStream;
use async_trait::async_trait;

const DISPLAY_NAME: &str = "OpenAI-compatible";

/// Resolve a user-supplied base URL to the chat-completions endpoint
///
/// - a URL already ending in `/completions` is used as is
/// - a URL ending in `/v1` gets `/chat/completions`
/// - anything else gets `/v1/chat/completions`
///
/// Trailing slashes are ignored.
pub fn normalize_endpoint(base_url: &str) -> String {
    let trimmed = base_url.trim().trim_end_matches('/');

    if trimmed.ends_with("/completions") {
        trimmed.to_string()
    } else if trimmed.ends_with("/v1") {
        format!("{}/chat/completions", trimmed)
    } else {
        format!("{}/v1/chat/completions", trimmed)
    }
}

/// Generic OpenAI-compatible provider
pub struct OpenAiCompatibleProvider {
    id: String,
    settings: OpenAiCompatibleSettings,
    http: HttpClient,
    empty_response: EmptyResponsePolicy,
}

impl OpenAiCompatibleProvider {
    pub fn new(
        id: impl Into<String>,
        settings: OpenAiCompatibleSettings,
        http: HttpSettings,
        empty_response: EmptyResponsePolicy,
    ) -> ProviderResult<Self> {
        Ok(Self {
            id: id.into(),
            settings,
            http: HttpClient::with_settings(http)?,
            empty_response,
        })
    }

    fn client(&self) -> ProviderResult<OpenAICompatClient> {
        if self.settings.base_url.trim().is_empty() {
            return Err(ProviderError::Configuration(
                "Server URL is not configured".to_string(),
            ));
        }

        // Local servers usually run without a key; send one only when set
        let key = self.settings.api_key.as_ref().map(|k| k.expose_secret());
        Ok(OpenAICompatClient::new(
            self.display_name(),
            self.http.clone(),
            normalize_endpoint(&self.settings.base_url),
            auth_headers(key, &[])?,
        ))
    }

    fn model_for(&self, request: &ChatRequest) -> ProviderResult<String> {
        resolve_model(&request.model, Some(&self.settings.model), None)
    }
}

#[async_trait]
impl Provider for OpenAiCompatibleProvider {
    fn id(&self) -> &str {
        &self.id
    }

    fn display_name(&self) -> &str {
        self.settings
            .display_name
            .as_deref()
            .filter(|n| !n.trim().is_empty())
            .unwrap_or(DISPLAY_NAME)
    }

    fn default_model(&self) -> Option<&str> {
        Some(self.settings.model.as_str()).filter(|m| !m.trim().is_empty())
    }

    async fn validate(&self) -> ValidationResult {
        let outcome = async {
            let client = self.client()?;
            let model = resolve_model("", Some(&self.settings.model), None)?;
            let probe = ChatRequest::new(model.as_str(), vec![Message::user("ping")]).with_max_tokens(1);
            client.complete(&probe, &model).await.map(|_| ())
        }
        .await;
        validation_outcome(self.display_name(), outcome)
    }

    /// Such servers commonly serve exactly the model they were started with
    async fn list_models(&self) -> Vec<ModelInfo> {
        match self.default_model() {
            Some(model) => vec![ModelInfo::new(model, model)],
            None => Vec::new(),
        }
    }

    async fn chat(&self, request: ChatRequest) -> ProviderResult<ChatResponse> {
        let client = self.client()?;
        let model = self.model_for(&request)?;
        let response = client.complete(&request, &model).await?;
        self.empty_response.check(response)
    }

    async fn chat_stream(&self, request: ChatRequest) -> ProviderResult<TokenStream> {
        let client = self.client()?;
        let model = self.model_for(&request)?;
        client.stream(&request, &model).await
    }
}
