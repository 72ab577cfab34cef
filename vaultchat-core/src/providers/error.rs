//! Provider error types and handling

use thiserror::Error;

/// Result type for provider operations
pub type ProviderResult<T> = Result<T, ProviderError>;

/// Errors that can occur when interacting with LLM providers
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProviderError {
    /// A required setting is missing or malformed; raised before any network call
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// The provider rejected the credentials
    #[error("Authentication failed: {0}")]
    Authentication(String),

    /// Network or connection error
    #[error("Network error: {0}")]
    Network(String),

    /// Timeout occurred
    #[error("Request timed out")]
    Timeout,

    /// Provider returned an error status or an error envelope
    #[error("{}", api_message(.status, .message))]
    Api {
        status: Option<u16>,
        message: String,
    },

    /// Provider refused to answer for content-safety reasons
    #[error("Response blocked by the provider: {0}")]
    ContentBlocked(String),

    /// Provider answered successfully but with no text
    #[error("Provider returned an empty response")]
    EmptyResponse,

    /// Response parsing error
    #[error("Failed to parse response: {0}")]
    Parse(String),
}

fn api_message(status: &Option<u16>, message: &str) -> String {
    match status {
        Some(code) => format!("Provider error ({}): {}", code, message),
        None => format!("Provider error: {}", message),
    }
}

impl ProviderError {
    /// Create an API error from a status code and message
    pub fn api(status: impl Into<Option<u16>>, message: impl Into<String>) -> Self {
        ProviderError::Api {
            status: status.into(),
            message: message.into(),
        }
    }

    /// Whether this error means the credentials were rejected
    pub fn is_authentication(&self) -> bool {
        matches!(self, ProviderError::Authentication(_))
    }
}

impl From<reqwest::Error> for ProviderError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            ProviderError::Timeout
        } else if err.is_connect() {
            ProviderError::Network(format!("Connection failed: {}", err))
        } else if err.is_decode() {
            ProviderError::Parse(err.to_string())
        } else if let Some(status) = err.status() {
            match status.as_u16() {
                401 | 403 => ProviderError::Authentication(err.to_string()),
                code => ProviderError::api(code, err.to_string()),
            }
        } else {
            ProviderError::Network(err.to_string())
        }
    }
}

impl From<serde_json::Error> for ProviderError {
    fn from(err: serde_json::Error) -> Self {
        ProviderError::Parse(err.to_string())
    }
}
