//! Configuration schema structures with serde support

use super::error::{ValidationError, ValidationErrorKind};
use super::secrets::SecretString;
use crate::http::HttpSettings;
use crate::providers::adapter::EmptyResponsePolicy;
use serde::{Deserialize, Serialize};

/// Schema version understood by this build
pub const CONFIG_VERSION: &str = "1";

/// Public OpenRouter endpoint
pub const OPENROUTER_BASE_URL: &str = "https://openrouter.ai/api/v1";

/// Default local Ollama endpoint
pub const OLLAMA_BASE_URL: &str = "http://localhost:11434";

/// Public Gemini endpoint
pub const GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Root configuration structure for VaultChat
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct VaultChatConfig {
    /// Schema version (required - no default)
    pub version: String,

    /// Configured provider instances
    #[serde(default)]
    pub providers: Vec<ProviderEntry>,

    /// Transport settings shared by every provider unless overridden
    #[serde(default)]
    pub http: HttpSettings,

    /// Request defaults for chat sessions
    #[serde(default)]
    pub defaults: ChatDefaults,

    /// Note grounding
    #[serde(default)]
    pub grounding: GroundingConfig,
}

/// One provider instance
///
/// The `type` tag selects the adapter; the remaining keys are that adapter's
/// settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ProviderEntry {
    /// Registry key for this instance
    pub id: String,

    /// Whether the instance is registered at all
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Per-provider transport override
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub http: Option<HttpSettings>,

    /// What a successful but empty answer means
    #[serde(default)]
    pub empty_response: EmptyResponsePolicy,

    #[serde(flatten)]
    pub settings: ProviderSettings,
}

impl ProviderEntry {
    /// Build an enabled entry with default transport behavior
    pub fn new(id: impl Into<String>, settings: ProviderSettings) -> Self {
        Self {
            id: id.into(),
            enabled: true,
            http: None,
            empty_response: EmptyResponsePolicy::default(),
            settings,
        }
    }
}

/// Adapter-specific settings, tagged by `type`
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ProviderSettings {
    #[serde(rename = "openrouter")]
    OpenRouter(OpenRouterSettings),
    #[serde(rename = "minimax")]
    MiniMax(MiniMaxSettings),
    Ollama(OllamaSettings),
    #[serde(rename = "openai_compatible")]
    OpenAiCompatible(OpenAiCompatibleSettings),
    Gemini(GeminiSettings),
}

impl ProviderSettings {
    /// Wire tag of the adapter kind
    pub fn kind(&self) -> &'static str {
        match self {
            ProviderSettings::OpenRouter(_) => "openrouter",
            ProviderSettings::MiniMax(_) => "minimax",
            ProviderSettings::Ollama(_) => "ollama",
            ProviderSettings::OpenAiCompatible(_) => "openai_compatible",
            ProviderSettings::Gemini(_) => "gemini",
        }
    }

    /// Explicit base URL, for the kinds that take one
    pub fn base_url(&self) -> Option<&str> {
        match self {
            ProviderSettings::OpenRouter(s) => Some(&s.base_url),
            ProviderSettings::MiniMax(s) => s.base_url.as_deref(),
            ProviderSettings::Ollama(s) => Some(&s.base_url),
            ProviderSettings::OpenAiCompatible(s) => Some(&s.base_url),
            ProviderSettings::Gemini(s) => Some(&s.base_url),
        }
    }
}

/// OpenRouter aggregator
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct OpenRouterSettings {
    #[serde(default)]
    pub api_key: SecretString,

    /// Model used when a request names none
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,

    #[serde(default = "default_openrouter_base_url")]
    pub base_url: String,

    /// Attribution sent as `HTTP-Referer`
    #[serde(default = "default_referer")]
    pub referer: String,

    /// Attribution sent as `X-Title`
    #[serde(default = "default_app_title")]
    pub title: String,
}

impl Default for OpenRouterSettings {
    fn default() -> Self {
        Self {
            api_key: SecretString::default(),
            model: None,
            base_url: default_openrouter_base_url(),
            referer: default_referer(),
            title: default_app_title(),
        }
    }
}

/// MiniMax API region
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Region {
    #[default]
    Global,
    China,
}

impl Region {
    /// Base URL of the region's API
    pub fn base_url(&self) -> &'static str {
        match self {
            Region::Global => "https://api.minimax.io/v1",
            Region::China => "https://api.minimaxi.com/v1",
        }
    }
}

/// MiniMax reasoning models
#[derive(Debug, Clone, PartialEq, Default, Deserialize, Serialize)]
pub struct MiniMaxSettings {
    #[serde(default)]
    pub api_key: SecretString,

    #[serde(default)]
    pub region: Region,

    /// Keep `<think>` blocks in the answer
    #[serde(default)]
    pub show_thinking: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,

    /// Replaces the region URL, for proxies
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
}

/// Local Ollama server
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct OllamaSettings {
    #[serde(default = "default_ollama_base_url")]
    pub base_url: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
}

impl Default for OllamaSettings {
    fn default() -> Self {
        Self {
            base_url: default_ollama_base_url(),
            model: None,
        }
    }
}

/// Any server speaking the OpenAI chat-completions dialect
#[derive(Debug, Clone, PartialEq, Default, Deserialize, Serialize)]
pub struct OpenAiCompatibleSettings {
    /// Server root or full completions URL
    #[serde(default)]
    pub base_url: String,

    /// Sent as a bearer token only when present
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<SecretString>,

    #[serde(default)]
    pub model: String,

    /// Name shown in model pickers
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
}

/// Google Gemini
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct GeminiSettings {
    #[serde(default)]
    pub api_key: SecretString,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,

    #[serde(default = "default_gemini_base_url")]
    pub base_url: String,
}

impl Default for GeminiSettings {
    fn default() -> Self {
        Self {
            api_key: SecretString::default(),
            model: None,
            base_url: default_gemini_base_url(),
        }
    }
}

/// Request defaults applied by chat sessions
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ChatDefaults {
    /// Provider used when the caller names none
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provider: Option<String>,

    /// Model used when the caller names none; adapters fall back to their own
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,

    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    /// Unset leaves sampling to the adapter (MiniMax picks 1.0)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
}

impl Default for ChatDefaults {
    fn default() -> Self {
        Self {
            provider: None,
            model: None,
            max_tokens: default_max_tokens(),
            temperature: None,
        }
    }
}

/// How notes are folded into the prompt
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct GroundingConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Search hits included per question
    #[serde(default = "default_max_documents")]
    pub max_documents: usize,

    /// Characters kept from each note
    #[serde(default = "default_max_excerpt_chars")]
    pub max_excerpt_chars: usize,
}

impl Default for GroundingConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            max_documents: default_max_documents(),
            max_excerpt_chars: default_max_excerpt_chars(),
        }
    }
}

// Default value functions for serde
fn default_true() -> bool { true }
fn default_max_tokens() -> u32 { 2048 }
fn default_max_documents() -> usize { 3 }
fn default_max_excerpt_chars() -> usize { 2000 }
fn default_openrouter_base_url() -> String { OPENROUTER_BASE_URL.to_string() }
fn default_ollama_base_url() -> String { OLLAMA_BASE_URL.to_string() }
fn default_gemini_base_url() -> String { GEMINI_BASE_URL.to_string() }
fn default_referer() -> String { "https://obsidian.md".to_string() }
fn default_app_title() -> String { "Vault Chat".to_string() }

impl Default for VaultChatConfig {
    fn default() -> Self {
        Self {
            version: CONFIG_VERSION.to_string(),
            providers: Vec::new(),
            http: HttpSettings::default(),
            defaults: ChatDefaults::default(),
            grounding: GroundingConfig::default(),
        }
    }
}

impl VaultChatConfig {
    /// Validate the configuration
    ///
    /// Missing API keys are not an error here; `validate()` on the provider
    /// reports them so the settings screen can show which one is incomplete.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.version.is_empty() {
            return Err(ValidationError::required("version"));
        }

        if self.version != CONFIG_VERSION {
            return Err(ValidationError::new(
                "version",
                ValidationErrorKind::UnsupportedVersion {
                    supported: CONFIG_VERSION.to_string(),
                    found: self.version.clone(),
                },
            ));
        }

        // Check for duplicate provider ids
        let mut seen_ids = std::collections::HashSet::new();
        for (i, entry) in self.providers.iter().enumerate() {
            if !seen_ids.insert(entry.id.as_str()) {
                return Err(ValidationError::new(
                    format!("providers[{}].id", i),
                    ValidationErrorKind::DuplicateProviderId {
                        id: entry.id.clone(),
                    },
                ));
            }

            entry.validate(&format!("providers[{}]", i))?;
        }

        if let Some(provider) = &self.defaults.provider {
            if !self.providers.iter().any(|p| &p.id == provider) {
                return Err(ValidationError::new(
                    "defaults.provider",
                    ValidationErrorKind::UnknownProvider {
                        id: provider.clone(),
                    },
                ));
            }
        }

        self.defaults.validate("defaults")?;
        self.grounding.validate("grounding")?;

        Ok(())
    }

    /// Entries that should be registered
    pub fn enabled_providers(&self) -> impl Iterator<Item = &ProviderEntry> {
        self.providers.iter().filter(|p| p.enabled)
    }

    /// Look up an entry by id
    pub fn provider(&self, id: &str) -> Option<&ProviderEntry> {
        self.providers.iter().find(|p| p.id == id)
    }
}

impl ProviderEntry {
    /// Validate one provider entry
    pub fn validate(&self, path: &str) -> Result<(), ValidationError> {
        if self.id.trim().is_empty() {
            return Err(ValidationError::required(format!("{}.id", path)));
        }

        if let Some(base_url) = self.settings.base_url() {
            // An empty generic URL is reported by validate() on the provider
            if !base_url.is_empty() {
                if let Err(e) = url::Url::parse(base_url) {
                    return Err(ValidationError::new(
                        format!("{}.base_url", path),
                        ValidationErrorKind::InvalidUrl {
                            message: e.to_string(),
                        },
                    ));
                }
            }
        }

        if let Some(http) = &self.http {
            validate_http(http, &format!("{}.http", path))?;
        }

        Ok(())
    }
}

impl ChatDefaults {
    pub fn validate(&self, path: &str) -> Result<(), ValidationError> {
        if self.temperature.is_some_and(|t| !(0.0..=2.0).contains(&t)) {
            return Err(ValidationError::out_of_range(
                format!("{}.temperature", path),
                "Temperature must be between 0.0 and 2.0",
            ));
        }

        if self.max_tokens == 0 {
            return Err(ValidationError::out_of_range(
                format!("{}.max_tokens", path),
                "Max tokens must be greater than 0",
            ));
        }

        Ok(())
    }
}

impl GroundingConfig {
    pub fn validate(&self, path: &str) -> Result<(), ValidationError> {
        if self.enabled && self.max_documents == 0 {
            return Err(ValidationError::out_of_range(
                format!("{}.max_documents", path),
                "At least one document must be allowed when grounding is enabled",
            ));
        }

        if self.max_excerpt_chars == 0 {
            return Err(ValidationError::out_of_range(
                format!("{}.max_excerpt_chars", path),
                "Excerpt length must be greater than 0",
            ));
        }

        Ok(())
    }
}

pub(crate) fn validate_http(http: &HttpSettings, path: &str) -> Result<(), ValidationError> {
    if http.connect_timeout.is_zero() {
        return Err(ValidationError::out_of_range(
            format!("{}.connect_timeout", path),
            "Connect timeout must be greater than 0",
        ));
    }
    if http.request_timeout.is_zero() {
        return Err(ValidationError::out_of_range(
            format!("{}.request_timeout", path),
            "Request timeout must be greater than 0",
        ));
    }
    Ok(())
}
