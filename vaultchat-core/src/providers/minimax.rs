//! MiniMax reasoning-model adapter
//!
//! MiniMax speaks the OpenAI dialect with two twists: errors may arrive in a
//! `base_resp` envelope on an HTTP 200, and the models wrap their reasoning
//! in `<think>` blocks inside the ordinary content. Unless the user opted to
//! see it, that reasoning is removed before text reaches the caller.

use super::adapter::{
    require_key, resolve_model, validation_outcome, EmptyResponsePolicy, Provider,
};
use super::error::ProviderResult;
use super::openai::{auth_headers, OpenAICompatClient};
use crate::config::MiniMaxSettings;
use crate::http::{HttpClient, HttpSettings};
use crate::protocol::{ChatRequest, ChatResponse, Message, ModelInfo, ValidationResult};
use crate::stream::{strip_thinking, suppress_thinking, TokenStream};
use async_trait::async_trait;
use tracing::debug;

const DISPLAY_NAME: &str = "MiniMax";
const DEFAULT_MODEL: &str = "MiniMax-M2";

/// Temperature sent when the request leaves it unset
pub const DEFAULT_TEMPERATURE: f32 = 1.0;

/// MiniMax rejects temperatures outside (0, 1]
const MIN_TEMPERATURE: f32 = 0.01;
const MAX_TEMPERATURE: f32 = 1.0;

const CONTEXT_LENGTH: u32 = 204_800;

/// MiniMax provider
pub struct MiniMaxProvider {
    id: String,
    settings: MiniMaxSettings,
    http: HttpClient,
    empty_response: EmptyResponsePolicy,
}

impl MiniMaxProvider {
    pub fn new(
        id: impl Into<String>,
        settings: MiniMaxSettings,
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

    /// Region URL unless an explicit override is configured
    pub fn base_url(&self) -> &str {
        self.settings
            .base_url
            .as_deref()
            .map(str::trim)
            .filter(|u| !u.is_empty())
            .unwrap_or_else(|| self.settings.region.base_url())
            .trim_end_matches('/')
    }

    fn client(&self) -> ProviderResult<OpenAICompatClient> {
        let key = require_key(DISPLAY_NAME, self.settings.api_key.expose_secret())?;
        Ok(OpenAICompatClient::new(
            DISPLAY_NAME,
            self.http.clone(),
            format!("{}/text/chatcompletion_v2", self.base_url()),
            auth_headers(Some(key), &[])?,
        ))
    }

    /// Apply MiniMax's sampling rules and resolve the model
    fn prepare(&self, mut request: ChatRequest) -> ProviderResult<(ChatRequest, String)> {
        let model = resolve_model(
            &request.model,
            self.settings.model.as_deref(),
            Some(DEFAULT_MODEL),
        )?;
        let temperature = request
            .temperature
            .unwrap_or(DEFAULT_TEMPERATURE)
            .clamp(MIN_TEMPERATURE, MAX_TEMPERATURE);
        request.temperature = Some(temperature);
        Ok((request, model))
    }
}

#[async_trait]
impl Provider for MiniMaxProvider {
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
        let probe = ChatRequest::new("", vec![Message::user("ping")]).with_max_tokens(1);
        let outcome = match self.client() {
            Ok(client) => match self.prepare(probe) {
                Ok((request, model)) => client.complete(&request, &model).await.map(|_| ()),
                Err(e) => Err(e),
            },
            Err(e) => Err(e),
        };
        validation_outcome(DISPLAY_NAME, outcome)
    }

    async fn list_models(&self) -> Vec<ModelInfo> {
        vec![
            ModelInfo::new("MiniMax-M2", "MiniMax M2").with_context_length(CONTEXT_LENGTH),
            ModelInfo::new("MiniMax-M2-Stable", "MiniMax M2 (Stable)")
                .with_context_length(CONTEXT_LENGTH),
        ]
    }

    async fn chat(&self, request: ChatRequest) -> ProviderResult<ChatResponse> {
        let client = self.client()?;
        let (request, model) = self.prepare(request)?;
        let mut response = client.complete(&request, &model).await?;

        if !self.settings.show_thinking {
            response.text = strip_thinking(&response.text);
        }
        self.empty_response.check(response)
    }

    async fn chat_stream(&self, request: ChatRequest) -> ProviderResult<TokenStream> {
        let client = self.client()?;
        let (request, model) = self.prepare(request)?;
        let stream = client.stream(&request, &model).await?;

        if self.settings.show_thinking {
            Ok(stream)
        } else {
            debug!("Suppressing reasoning blocks in MiniMax stream");
            Ok(suppress_thinking(stream))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{Region, SecretString};

    fn provider(settings: MiniMaxSettings) -> MiniMaxProvider {
        MiniMaxProvider::new("mm", settings, HttpSettings::default(), EmptyResponsePolicy::Allow)
            .unwrap()
    }

    #[test]
    fn test_region_urls() {
        let global = provider(MiniMaxSettings::default());
        assert_eq!(global.base_url(), "https://api.minimax.io/v1");

        let china = provider(MiniMaxSettings {
            region: Region::China,
            ..Default::default()
        });
        assert_eq!(china.base_url(), "https://api.minimaxi.com/v1");

        let proxied = provider(MiniMaxSettings {
            base_url: Some("http://127.0.0.1:9000/v1/".to_string()),
            ..Default::default()
        });
        assert_eq!(proxied.base_url(), "http://127.0.0.1:9000/v1");
    }

    #[test]
    fn test_temperature_defaults_and_clamps() {
        let p = provider(MiniMaxSettings {
            api_key: SecretString::new("k"),
            ..Default::default()
        });

        let (request, model) = p.prepare(ChatRequest::new("", vec!["hi"])).unwrap();
        assert_eq!(request.temperature, Some(DEFAULT_TEMPERATURE));
        assert_eq!(model, DEFAULT_MODEL);

        let (request, _) = p
            .prepare(ChatRequest::new("MiniMax-M2", vec!["hi"]).with_temperature(1.7))
            .unwrap();
        assert_eq!(request.temperature, Some(1.0));

        let (request, _) = p
            .prepare(ChatRequest::new("MiniMax-M2", vec!["hi"]).with_temperature(0.0))
            .unwrap();
        assert_eq!(request.temperature, Some(MIN_TEMPERATURE));
    }

    #[tokio::test]
    async fn test_missing_key_reported_without_network() {
        let result = provider(MiniMaxSettings::default()).validate().await;
        assert!(!result.valid);
        assert_eq!(
            result.error.as_deref(),
            Some("MiniMax API key is not configured")
        );
    }
}
