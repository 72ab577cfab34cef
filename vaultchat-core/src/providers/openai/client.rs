//! Transport shared by adapters that speak the OpenAI dialect

use super::converter::{from_openai_models, from_openai_response, to_openai_request};
use super::streaming::OpenAISseDecoder;
use super::types::{OpenAIModelList, OpenAIResponse};
use crate::http::{error_from_envelope, HttpClient};
use crate::protocol::{ChatRequest, ChatResponse, ModelInfo};
use crate::providers::error::{ProviderError, ProviderResult};
use crate::stream::{normalize, TokenStream};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, AUTHORIZATION};
use serde_json::Value;
use tracing::debug;

/// Posts OpenAI-style chat requests to one endpoint
#[derive(Debug, Clone)]
pub struct OpenAICompatClient {
    /// Name used in logs and stream diagnostics
    provider: String,
    http: HttpClient,
    chat_url: String,
    headers: HeaderMap,
}

impl OpenAICompatClient {
    pub fn new(
        provider: impl Into<String>,
        http: HttpClient,
        chat_url: impl Into<String>,
        headers: HeaderMap,
    ) -> Self {
        Self {
            provider: provider.into(),
            http,
            chat_url: chat_url.into(),
            headers,
        }
    }

    /// Fully resolved chat-completions URL
    pub fn chat_url(&self) -> &str {
        &self.chat_url
    }

    /// Blocking completion
    pub async fn complete(&self, request: &ChatRequest, model: &str) -> ProviderResult<ChatResponse> {
        let body = to_openai_request(request, model, false);
        debug!(
            "Sending {} chat request [model: {}, messages: {}]",
            self.provider,
            model,
            body.messages.len()
        );

        let text = self
            .http
            .post_json(&self.provider, &self.chat_url, self.headers.clone(), &body)
            .await?;
        parse_completion(&text)
    }

    /// Streaming completion
    pub async fn stream(&self, request: &ChatRequest, model: &str) -> ProviderResult<TokenStream> {
        let body = to_openai_request(request, model, true);
        debug!("Opening {} stream [model: {}]", self.provider, model);

        let response = self
            .http
            .post_stream(&self.provider, &self.chat_url, self.headers.clone(), &body)
            .await?;
        Ok(normalize(
            &self.provider,
            response.bytes_stream(),
            OpenAISseDecoder::new(),
        ))
    }

    /// `GET` an OpenAI-style model listing
    pub async fn list_models(&self, url: &str) -> ProviderResult<Vec<ModelInfo>> {
        let text = self
            .http
            .get_text(&self.provider, url, self.headers.clone())
            .await?;
        let list: OpenAIModelList = serde_json::from_str(&text)?;
        Ok(from_openai_models(list))
    }

    /// `GET` a URL with this client's headers, discarding the body
    pub async fn probe(&self, url: &str) -> ProviderResult<()> {
        self.http
            .get_text(&self.provider, url, self.headers.clone())
            .await
            .map(|_| ())
    }
}

/// Parse a completion body, honoring error envelopes delivered with 200
pub fn parse_completion(body: &str) -> ProviderResult<ChatResponse> {
    let value: Value = serde_json::from_str(body)?;
    if let Some(err) = error_from_envelope(&value) {
        return Err(err);
    }
    let response: OpenAIResponse = serde_json::from_value(value)?;
    from_openai_response(response)
}

/// Headers with an optional bearer token plus extra fixed headers
pub fn auth_headers(api_key: Option<&str>, extra: &[(&'static str, &str)]) -> ProviderResult<HeaderMap> {
    let mut headers = HeaderMap::new();

    if let Some(key) = api_key.map(str::trim).filter(|k| !k.is_empty()) {
        let value = HeaderValue::from_str(&format!("Bearer {}", key)).map_err(|_| {
            ProviderError::Configuration("API key contains invalid characters".to_string())
        })?;
        headers.insert(AUTHORIZATION, value);
    }

    for (name, value) in extra {
        let value = HeaderValue::from_str(value).map_err(|_| {
            ProviderError::Configuration(format!("Invalid value for header {}", name))
        })?;
        headers.insert(HeaderName::from_static(name), value);
    }

    Ok(headers)
}
