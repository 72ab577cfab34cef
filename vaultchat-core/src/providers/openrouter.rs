//! OpenRouter aggregator adapter

use super::adapter::{
    require_key, resolve_model, validation_outcome, EmptyResponsePolicy, Provider,
};
use super::error::ProviderResult;
use super::openai::{auth_headers, OpenAICompatClient};
use crate::config::OpenRouterSettings;
use crate::http::{HttpClient, HttpSettings};
use crate::protocol::{ChatRequest, ChatResponse, ModelInfo, ValidationResult};
use crate::stream::TokenStream;
use async_trait::async_trait;
use tracing::{info, warn};

const DISPLAY_NAME: &str = "OpenRouter";
const DEFAULT_MODEL: &str = "openai/gpt-4o-mini";

/// Shown when the live listing cannot be fetched
pub const FALLBACK_MODELS: [(&str, &str); 4] = [
    ("openai/gpt-4o", "GPT-4o"),
    ("openai/gpt-4o-mini", "GPT-4o mini"),
    ("anthropic/claude-3.5-sonnet", "Claude 3.5 Sonnet"),
    ("google/gemini-flash-1.5", "Gemini 1.5 Flash"),
];

/// OpenRouter provider
pub struct OpenRouterProvider {
    id: String,
    settings: OpenRouterSettings,
    http: HttpClient,
    empty_response: EmptyResponsePolicy,
}

impl OpenRouterProvider {
    /// Create a new OpenRouter provider
    ///
    /// A missing key is not an error here; calls fail with a configuration
    /// error and `validate()` reports it.
    pub fn new(
        id: impl Into<String>,
        settings: OpenRouterSettings,
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

    fn base_url(&self) -> &str {
        self.settings.base_url.trim_end_matches('/')
    }

    /// Client carrying the bearer token and attribution headers
    fn client(&self) -> ProviderResult<OpenAICompatClient> {
        let key = require_key(DISPLAY_NAME, self.settings.api_key.expose_secret())?;
        let headers = auth_headers(
            Some(key),
            &[
                ("http-referer", self.settings.referer.as_str()),
                ("x-title", self.settings.title.as_str()),
            ],
        )?;
        Ok(OpenAICompatClient::new(
            DISPLAY_NAME,
            self.http.clone(),
            format!("{}/chat/completions", self.base_url()),
            headers,
        ))
    }

    fn model_for(&self, request: &ChatRequest) -> ProviderResult<String> {
        resolve_model(
            &request.model,
            self.settings.model.as_deref(),
            Some(DEFAULT_MODEL),
        )
    }

    fn fallback_models() -> Vec<ModelInfo> {
        FALLBACK_MODELS
            .iter()
            .map(|(id, name)| ModelInfo::new(*id, *name))
            .collect()
    }
}

#[async_trait]
impl Provider for OpenRouterProvider {
    fn id(&self) -> &str {
        &self.id
    }

    fn display_name(&self) -> &str {
        DISPLAY_NAME
    }

    fn default_model(&self) -> Option<&str> {
        Some(self.settings.model.as_deref().unwrap_or(DEFAULT_MODEL))
    }

    async fn validate(&self) -> ValidationResult {
        // The key endpoint is free and rejects bad credentials; /models does not
        let outcome = match self.client() {
            Ok(client) => client.probe(&format!("{}/auth/key", self.base_url())).await,
            Err(e) => Err(e),
        };
        validation_outcome(DISPLAY_NAME, outcome)
    }

    async fn list_models(&self) -> Vec<ModelInfo> {
        let headers = match auth_headers(Some(self.settings.api_key.expose_secret()), &[]) {
            Ok(headers) => headers,
            Err(_) => return Self::fallback_models(),
        };
        let client = OpenAICompatClient::new(DISPLAY_NAME, self.http.clone(), "", headers);

        match client.list_models(&format!("{}/models", self.base_url())).await {
            Ok(models) if !models.is_empty() => {
                info!("Fetched {} OpenRouter models", models.len());
                models
            }
            Ok(_) => Self::fallback_models(),
            Err(e) => {
                warn!("Falling back to built-in OpenRouter models: {}", e);
                Self::fallback_models()
            }
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
