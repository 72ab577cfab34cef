//! Google Gemini adapter
//!
//! Gemini differs from the OpenAI dialect in several ways:
//! - the key travels in the `key` query parameter
//! - roles are `user` and `model`, and there is no system role; system text
//!   is prepended to the first user turn
//! - responses are `candidates[].content.parts[].text`
//! - a request can be refused for safety reasons with a 200 status
//! - streams (`alt=sse`) have no terminal sentinel and end when the
//!   connection closes

use super::adapter::{
    require_key, resolve_model, validation_outcome, EmptyResponsePolicy, Provider,
};
use super::error::{ProviderError, ProviderResult};
use crate::config::GeminiSettings;
use crate::http::{error_from_envelope, HttpClient, HttpSettings};
use crate::protocol::{
    ChatRequest, ChatResponse, CompletionUsage, MessageRole, ModelInfo, ValidationResult,
};
use crate::stream::{normalize, sse_data, Frame, FrameDecoder, TokenStream};
use async_trait::async_trait;
use reqwest::header::HeaderMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};
use url::Url;

const DISPLAY_NAME: &str = "Gemini";
const DEFAULT_MODEL: &str = "gemini-2.0-flash";

/// Shown when the live listing cannot be fetched
pub const FALLBACK_MODELS: [(&str, &str, u32); 3] = [
    ("gemini-2.0-flash", "Gemini 2.0 Flash", 1_048_576),
    ("gemini-1.5-pro", "Gemini 1.5 Pro", 2_097_152),
    ("gemini-1.5-flash", "Gemini 1.5 Flash", 1_048_576),
];

/// Finish reasons that mean the answer was withheld
const BLOCKING_FINISH_REASONS: [&str; 4] = ["SAFETY", "BLOCKLIST", "PROHIBITED_CONTENT", "SPII"];

// ============================================================================
// Wire types
// ============================================================================

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiRequest {
    contents: Vec<GeminiContent>,
    #[serde(skip_serializing_if = "GenerationConfig::is_empty")]
    generation_config: GenerationConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct GeminiContent {
    #[serde(default)]
    role: String,
    #[serde(default)]
    parts: Vec<GeminiPart>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct GeminiPart {
    #[serde(default)]
    text: String,
}

#[derive(Debug, Default, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    max_output_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
}

impl GenerationConfig {
    fn is_empty(&self) -> bool {
        self.max_output_tokens.is_none() && self.temperature.is_none()
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<GeminiCandidate>,
    #[serde(default)]
    prompt_feedback: Option<PromptFeedback>,
    #[serde(default)]
    usage_metadata: Option<UsageMetadata>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiCandidate {
    #[serde(default)]
    content: Option<GeminiContent>,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    #[serde(default)]
    block_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UsageMetadata {
    #[serde(default)]
    prompt_token_count: u32,
    #[serde(default)]
    candidates_token_count: u32,
}

#[derive(Debug, Deserialize)]
struct GeminiModelList {
    #[serde(default)]
    models: Vec<GeminiModel>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiModel {
    name: String,
    #[serde(default)]
    display_name: Option<String>,
    #[serde(default)]
    input_token_limit: Option<u32>,
    #[serde(default)]
    supported_generation_methods: Vec<String>,
}

// ============================================================================
// Conversion
// ============================================================================

/// Build Gemini `contents` from the uniform message list
///
/// System messages are joined with a blank line and prepended to the first
/// user turn, or become a user turn of their own when there is none.
fn to_gemini_contents(request: &ChatRequest) -> Vec<GeminiContent> {
    let system: Vec<&str> = request
        .messages
        .iter()
        .filter(|m| m.role == MessageRole::System)
        .map(|m| m.content.as_str())
        .collect();
    let mut system_text = (!system.is_empty()).then(|| system.join("\n\n"));

    let mut contents = Vec::new();
    for message in request.messages.iter().filter(|m| m.role != MessageRole::System) {
        let (role, text) = match message.role {
            MessageRole::User => match system_text.take() {
                Some(system) => ("user", format!("{}\n\n{}", system, message.content)),
                None => ("user", message.content.clone()),
            },
            _ => ("model", message.content.clone()),
        };
        contents.push(GeminiContent {
            role: role.to_string(),
            parts: vec![GeminiPart { text }],
        });
    }

    if let Some(system) = system_text {
        contents.insert(
            0,
            GeminiContent {
                role: "user".to_string(),
                parts: vec![GeminiPart { text: system }],
            },
        );
    }

    contents
}

fn to_gemini_request(request: &ChatRequest) -> GeminiRequest {
    GeminiRequest {
        contents: to_gemini_contents(request),
        generation_config: GenerationConfig {
            max_output_tokens: request.max_tokens,
            temperature: request.temperature,
        },
    }
}

/// Raise when Gemini withheld the answer
fn check_blocked(response: &GeminiResponse) -> ProviderResult<()> {
    if let Some(reason) = response
        .prompt_feedback
        .as_ref()
        .and_then(|f| f.block_reason.as_deref())
    {
        return Err(ProviderError::ContentBlocked(format!(
            "prompt blocked ({})",
            reason
        )));
    }

    if let Some(reason) = response
        .candidates
        .first()
        .and_then(|c| c.finish_reason.as_deref())
        .filter(|r| BLOCKING_FINISH_REASONS.contains(r))
    {
        return Err(ProviderError::ContentBlocked(format!(
            "response stopped ({})",
            reason
        )));
    }

    Ok(())
}

/// Concatenated text of the first candidate
fn candidate_text(response: &GeminiResponse) -> String {
    response
        .candidates
        .first()
        .and_then(|c| c.content.as_ref())
        .map(|c| c.parts.iter().map(|p| p.text.as_str()).collect())
        .unwrap_or_default()
}

/// Parse a Gemini body, checking for error envelopes and blocking first
fn parse_response(value: Value) -> ProviderResult<GeminiResponse> {
    if let Some(err) = error_from_envelope(&value) {
        return Err(map_key_error(err));
    }
    let response: GeminiResponse = serde_json::from_value(value)?;
    check_blocked(&response)?;
    Ok(response)
}

fn from_gemini_response(response: GeminiResponse) -> ChatResponse {
    let mut chat = ChatResponse::new(candidate_text(&response));
    if let Some(usage) = response.usage_metadata {
        chat = chat.with_usage(CompletionUsage::new(
            usage.prompt_token_count,
            usage.candidates_token_count,
        ));
    }
    chat
}

/// Gemini reports a bad key as a 400 rather than 401
fn map_key_error(err: ProviderError) -> ProviderError {
    match err {
        ProviderError::Api { message, .. }
            if message.contains("API key not valid") || message.contains("API_KEY_INVALID") =>
        {
            ProviderError::Authentication(message)
        }
        other => other,
    }
}

/// Decodes Gemini's `alt=sse` stream
///
/// Each event is a complete `GenerateContentResponse`. There is no sentinel;
/// the stream ends when the server closes the connection.
#[derive(Debug, Default)]
pub struct GeminiSseDecoder;

impl GeminiSseDecoder {
    pub fn new() -> Self {
        Self
    }
}

impl FrameDecoder for GeminiSseDecoder {
    fn decode_line(&mut self, line: &str) -> Frame {
        let Some(data) = sse_data(line).filter(|d| !d.is_empty()) else {
            return Frame::Skip;
        };

        let value: Value = match serde_json::from_str(data) {
            Ok(value) => value,
            Err(e) => {
                debug!("Skipping unparseable Gemini chunk: {}", e);
                return Frame::Skip;
            }
        };

        match parse_response(value) {
            Ok(response) => {
                let text = candidate_text(&response);
                if text.is_empty() {
                    Frame::Skip
                } else {
                    Frame::Delta(text)
                }
            }
            Err(ProviderError::Parse(e)) => {
                debug!("Skipping Gemini chunk with unexpected shape: {}", e);
                Frame::Skip
            }
            Err(err) => Frame::Error(err),
        }
    }

    fn has_terminal_signal(&self) -> bool {
        false
    }
}

// ============================================================================
// Provider
// ============================================================================

/// Gemini provider
pub struct GeminiProvider {
    id: String,
    settings: GeminiSettings,
    http: HttpClient,
    empty_response: EmptyResponsePolicy,
}

impl GeminiProvider {
    pub fn new(
        id: impl Into<String>,
        settings: GeminiSettings,
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

    /// `{base}/{path}` with the key and extra pairs as query parameters
    fn url(&self, path: &str, query: &[(&str, &str)]) -> ProviderResult<String> {
        let key = require_key(DISPLAY_NAME, self.settings.api_key.expose_secret())?;
        let base = self.settings.base_url.trim().trim_end_matches('/');
        let mut url = Url::parse(&format!("{}/{}", base, path))
            .map_err(|e| ProviderError::Configuration(format!("Invalid Gemini URL: {}", e)))?;
        {
            let mut pairs = url.query_pairs_mut();
            for (name, value) in query {
                pairs.append_pair(name, value);
            }
            pairs.append_pair("key", key);
        }
        Ok(url.into())
    }

    fn model_for(&self, request: &ChatRequest) -> ProviderResult<String> {
        let model = resolve_model(
            &request.model,
            self.settings.model.as_deref(),
            Some(DEFAULT_MODEL),
        )?;
        Ok(model.trim_start_matches("models/").to_string())
    }

    async fn fetch_models(&self) -> ProviderResult<Vec<ModelInfo>> {
        let url = self.url("models", &[("pageSize", "100")])?;
        let text = self
            .http
            .get_text(DISPLAY_NAME, &url, HeaderMap::new())
            .await
            .map_err(map_key_error)?;
        let list: GeminiModelList = serde_json::from_str(&text)?;

        Ok(list
            .models
            .into_iter()
            .filter(|m| {
                m.supported_generation_methods
                    .iter()
                    .any(|g| g == "generateContent")
            })
            .map(|m| {
                let id = m.name.trim_start_matches("models/").to_string();
                let name = m.display_name.unwrap_or_else(|| id.clone());
                let info = ModelInfo::new(id, name);
                match m.input_token_limit {
                    Some(limit) => info.with_context_length(limit),
                    None => info,
                }
            })
            .collect())
    }

    fn fallback_models() -> Vec<ModelInfo> {
        FALLBACK_MODELS
            .iter()
            .map(|(id, name, ctx)| ModelInfo::new(*id, *name).with_context_length(*ctx))
            .collect()
    }
}

#[async_trait]
impl Provider for GeminiProvider {
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
        let outcome = match self.url("models", &[("pageSize", "1")]) {
            Ok(url) => self
                .http
                .get_text(DISPLAY_NAME, &url, HeaderMap::new())
                .await
                .map(|_| ())
                .map_err(map_key_error),
            Err(e) => Err(e),
        };
        validation_outcome(DISPLAY_NAME, outcome)
    }

    async fn list_models(&self) -> Vec<ModelInfo> {
        match self.fetch_models().await {
            Ok(models) if !models.is_empty() => models,
            Ok(_) => Self::fallback_models(),
            Err(e) => {
                warn!("Falling back to built-in Gemini models: {}", e);
                Self::fallback_models()
            }
        }
    }

    async fn chat(&self, request: ChatRequest) -> ProviderResult<ChatResponse> {
        let model = self.model_for(&request)?;
        let url = self.url(&format!("models/{}:generateContent", model), &[])?;
        let body = to_gemini_request(&request);

        let text = self
            .http
            .post_json(DISPLAY_NAME, &url, HeaderMap::new(), &body)
            .await
            .map_err(map_key_error)?;
        let value: Value = serde_json::from_str(&text)?;
        let response = from_gemini_response(parse_response(value)?);
        self.empty_response.check(response)
    }

    async fn chat_stream(&self, request: ChatRequest) -> ProviderResult<TokenStream> {
        let model = self.model_for(&request)?;
        let url = self.url(
            &format!("models/{}:streamGenerateContent", model),
            &[("alt", "sse")],
        )?;
        let body = to_gemini_request(&request);

        let response = self
            .http
            .post_stream(DISPLAY_NAME, &url, HeaderMap::new(), &body)
            .await
            .map_err(map_key_error)?;
        Ok(normalize(
            DISPLAY_NAME,
            response.bytes_stream(),
            GeminiSseDecoder::new(),
        ))
    }
}
