//! Ollama adapter
//!
//! Talks to a local Ollama server through its native `/api/chat` endpoint.
//! Streams are newline-delimited JSON objects rather than server-sent events;
//! the object with `"done": true` ends the answer.

use super::adapter::{resolve_model, validation_outcome, EmptyResponsePolicy, Provider};
use super::error::{ProviderError, ProviderResult};
use crate::config::OllamaSettings;
use crate::http::{error_from_envelope, HttpClient, HttpSettings};
use crate::protocol::{
    ChatRequest, ChatResponse, CompletionUsage, Message, ModelInfo, ValidationResult,
};
use crate::stream::{normalize, Frame, FrameDecoder, TokenStream};
use async_trait::async_trait;
use reqwest::header::HeaderMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info, warn};

const DISPLAY_NAME: &str = "Ollama";

/// `/api/chat` request body
#[derive(Debug, Serialize)]
struct OllamaChatRequest<'a> {
    model: &'a str,
    messages: Vec<OllamaMessage<'a>>,
    stream: bool,
    #[serde(skip_serializing_if = "OllamaOptions::is_empty")]
    options: OllamaOptions,
}

#[derive(Debug, Serialize)]
struct OllamaMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Default, Serialize)]
struct OllamaOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    num_predict: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
}

impl OllamaOptions {
    fn is_empty(&self) -> bool {
        self.num_predict.is_none() && self.temperature.is_none()
    }
}

/// One `/api/chat` response object, whole or streamed
#[derive(Debug, Deserialize)]
struct OllamaChatChunk {
    #[serde(default)]
    message: Option<OllamaResponseMessage>,
    #[serde(default)]
    done: bool,
    #[serde(default)]
    prompt_eval_count: Option<u32>,
    #[serde(default)]
    eval_count: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct OllamaResponseMessage {
    #[serde(default)]
    content: String,
}

#[derive(Debug, Deserialize)]
struct OllamaTags {
    #[serde(default)]
    models: Vec<OllamaTag>,
}

#[derive(Debug, Deserialize)]
struct OllamaTag {
    name: String,
}

/// Decodes Ollama's newline-delimited JSON stream
///
/// A final object that carries both text and `done` is delivered as a delta;
/// the terminal delta then comes from the end of the stream or the next line.
#[derive(Debug, Default)]
pub struct OllamaNdjsonDecoder {
    finished: bool,
}

impl OllamaNdjsonDecoder {
    pub fn new() -> Self {
        Self::default()
    }
}

impl FrameDecoder for OllamaNdjsonDecoder {
    fn decode_line(&mut self, line: &str) -> Frame {
        if self.finished {
            return Frame::Done;
        }

        let line = line.trim();
        if line.is_empty() {
            return Frame::Skip;
        }

        let value: Value = match serde_json::from_str(line) {
            Ok(value) => value,
            Err(e) => {
                debug!("Skipping unparseable Ollama line: {}", e);
                return Frame::Skip;
            }
        };

        if let Some(err) = error_from_envelope(&value) {
            return Frame::Error(err);
        }

        let chunk: OllamaChatChunk = match serde_json::from_value(value) {
            Ok(chunk) => chunk,
            Err(e) => {
                debug!("Skipping Ollama line with unexpected shape: {}", e);
                return Frame::Skip;
            }
        };

        let text = chunk.message.map(|m| m.content).unwrap_or_default();
        match (text.is_empty(), chunk.done) {
            (true, true) => Frame::Done,
            (false, true) => {
                self.finished = true;
                Frame::Delta(text)
            }
            (false, false) => Frame::Delta(text),
            (true, false) => Frame::Skip,
        }
    }
}

/// Ollama provider
pub struct OllamaProvider {
    id: String,
    settings: OllamaSettings,
    http: HttpClient,
    empty_response: EmptyResponsePolicy,
}

impl OllamaProvider {
    pub fn new(
        id: impl Into<String>,
        settings: OllamaSettings,
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

    fn base_url(&self) -> ProviderResult<&str> {
        let url = self.settings.base_url.trim().trim_end_matches('/');
        if url.is_empty() {
            Err(ProviderError::Configuration(
                "Ollama server URL is not configured".to_string(),
            ))
        } else {
            Ok(url)
        }
    }

    fn body<'a>(&self, request: &'a ChatRequest, model: &'a str, stream: bool) -> OllamaChatRequest<'a> {
        OllamaChatRequest {
            model,
            messages: request.messages.iter().map(to_ollama_message).collect(),
            stream,
            options: OllamaOptions {
                num_predict: request.max_tokens,
                temperature: request.temperature,
            },
        }
    }

    fn model_for(&self, request: &ChatRequest) -> ProviderResult<String> {
        resolve_model(&request.model, self.settings.model.as_deref(), None)
    }

    async fn fetch_tags(&self) -> ProviderResult<OllamaTags> {
        let url = format!("{}/api/tags", self.base_url()?);
        let text = self
            .http
            .get_text(DISPLAY_NAME, &url, HeaderMap::new())
            .await?;
        Ok(serde_json::from_str(&text)?)
    }
}

fn to_ollama_message(message: &Message) -> OllamaMessage<'_> {
    OllamaMessage {
        role: message.role.as_str(),
        content: &message.content,
    }
}

fn parse_chat_response(body: &str) -> ProviderResult<ChatResponse> {
    let value: Value = serde_json::from_str(body)?;
    if let Some(err) = error_from_envelope(&value) {
        return Err(err);
    }
    let chunk: OllamaChatChunk = serde_json::from_value(value)?;

    let text = chunk.message.map(|m| m.content).unwrap_or_default();
    let mut response = ChatResponse::new(text);
    if let (Some(prompt), Some(completion)) = (chunk.prompt_eval_count, chunk.eval_count) {
        response = response.with_usage(CompletionUsage::new(prompt, completion));
    }
    Ok(response)
}

#[async_trait]
impl Provider for OllamaProvider {
    fn id(&self) -> &str {
        &self.id
    }

    fn display_name(&self) -> &str {
        DISPLAY_NAME
    }

    fn default_model(&self) -> Option<&str> {
        self.settings.model.as_deref()
    }

    async fn validate(&self) -> ValidationResult {
        let outcome = match self.fetch_tags().await {
            Ok(_) => Ok(()),
            Err(ProviderError::Network(_)) | Err(ProviderError::Timeout) => {
                Err(ProviderError::Network(format!(
                    "no server at {}. Is Ollama running?",
                    self.settings.base_url
                )))
            }
            Err(e) => Err(e),
        };
        validation_outcome(DISPLAY_NAME, outcome)
    }

    async fn list_models(&self) -> Vec<ModelInfo> {
        match self.fetch_tags().await {
            Ok(tags) => {
                info!("Found {} local Ollama models", tags.models.len());
                tags.models
                    .into_iter()
                    .map(|t| ModelInfo::new(t.name.clone(), t.name))
                    .collect()
            }
            Err(e) => {
                warn!("Could not list Ollama models: {}", e);
                Vec::new()
            }
        }
    }

    async fn chat(&self, request: ChatRequest) -> ProviderResult<ChatResponse> {
        let url = format!("{}/api/chat", self.base_url()?);
        let model = self.model_for(&request)?;
        let body = self.body(&request, &model, false);

        let text = self
            .http
            .post_json(DISPLAY_NAME, &url, HeaderMap::new(), &body)
            .await?;
        self.empty_response.check(parse_chat_response(&text)?)
    }

    async fn chat_stream(&self, request: ChatRequest) -> ProviderResult<TokenStream> {
        let url = format!("{}/api/chat", self.base_url()?);
        let model = self.model_for(&request)?;
        let body = self.body(&request, &model, true);

        let response = self
            .http
            .post_stream(DISPLAY_NAME, &url, HeaderMap::new(), &body)
            .await?;
        Ok(normalize(
            DISPLAY_NAME,
            response.bytes_stream(),
            OllamaNdjsonDecoder::new(),
        ))
    }
}
