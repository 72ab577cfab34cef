//! Secrets management and redaction for configuration
//!
//! API keys are wrapped in [`SecretString`] so they never reach Display or
//! Debug output; [`SafeLogging`] renders provider entries for log lines.

use super::schema::{ProviderEntry, ProviderSettings};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A wrapper type for sensitive strings like API keys
#[derive(Clone, Default, Deserialize, Serialize)]
#[serde(transparent)]
pub struct SecretString {
    value: String,
}

impl SecretString {
    /// Create a new secret string
    pub fn new(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
        }
    }

    /// Get the actual value (use with caution)
    pub fn expose_secret(&self) -> &str {
        &self.value
    }

    /// Check if the secret is empty
    pub fn is_empty(&self) -> bool {
        self.value.is_empty()
    }

    /// Get a partially redacted version for debugging
    pub fn partial_redact(&self) -> String {
        if self.value.is_empty() {
            return "[EMPTY]".to_string();
        }

        let chars: Vec<char> = self.value.chars().collect();
        let len = chars.len();
        if len <= 8 {
            // Very short secrets get fully redacted
            "[REDACTED]".to_string()
        } else if self.value.starts_with("sk-") || self.value.starts_with("pk-") {
            // API keys with prefixes
            format!("{}...{}", edge(&chars[..3]), edge(&chars[len - 4..]))
        } else {
            format!("{}...{}", edge(&chars[..2]), edge(&chars[len - 2..]))
        }
    }
}

fn edge(chars: &[char]) -> String {
    chars.iter().collect()
}

impl fmt::Debug for SecretString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[REDACTED]")
    }
}

impl fmt::Display for SecretString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[REDACTED]")
    }
}

impl Eq for SecretString {}

impl PartialEq for SecretString {
    fn eq(&self, other: &Self) -> bool {
        self.value == other.value
    }
}

impl From<String> for SecretString {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}

impl From<&str> for SecretString {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

/// A trait for types that can be logged safely
pub trait SafeLogging {
    /// Returns a safe version for logging
    fn safe_for_logging(&self) -> String;
}

impl SafeLogging for ProviderEntry {
    fn safe_for_logging(&self) -> String {
        let key = match &self.settings {
            ProviderSettings::OpenRouter(s) => Some(s.api_key.partial_redact()),
            ProviderSettings::MiniMax(s) => Some(s.api_key.partial_redact()),
            ProviderSettings::Gemini(s) => Some(s.api_key.partial_redact()),
            ProviderSettings::OpenAiCompatible(s) => s.api_key.as_ref().map(|k| k.partial_redact()),
            ProviderSettings::Ollama(_) => None,
        };
        match key {
            Some(key) => format!("{} ({}, key {})", self.id, self.settings.kind(), key),
            None => format!("{} ({})", self.id, self.settings.kind()),
        }
    }
}
