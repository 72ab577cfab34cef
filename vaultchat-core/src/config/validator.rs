//! Configuration validation utilities

use super::error::{ValidationError, ValidationErrorKind};
use super::schema::{validate_http, ProviderSettings, VaultChatConfig};
use super::secrets::SafeLogging;
use tracing::warn;

/// Configuration validator with rules that span several sections
#[derive(Debug, Default)]
pub struct ConfigValidator {
    /// Treat enabled cloud providers without a key as an error
    require_keys: bool,
}

impl ConfigValidator {
    /// Create a new validator
    pub fn new() -> Self {
        Self::default()
    }

    /// Reject enabled cloud providers that have no API key
    pub fn require_keys(mut self, require: bool) -> Self {
        self.require_keys = require;
        self
    }

    /// Validate a configuration with extended rules
    pub fn validate(&self, config: &VaultChatConfig) -> Result<(), ValidationError> {
        config.validate()?;

        validate_http(&config.http, "http")?;
        self.validate_default_provider(config)?;
        self.validate_keys(config)?;

        Ok(())
    }

    /// The default provider must be one that will be registered
    fn validate_default_provider(&self, config: &VaultChatConfig) -> Result<(), ValidationError> {
        let Some(id) = &config.defaults.provider else {
            return Ok(());
        };

        match config.provider(id) {
            Some(entry) if !entry.enabled => Err(ValidationError::new(
                "defaults.provider",
                ValidationErrorKind::ProviderDisabled { id: id.clone() },
            )),
            _ => Ok(()),
        }
    }

    fn validate_keys(&self, config: &VaultChatConfig) -> Result<(), ValidationError> {
        for (i, entry) in config.providers.iter().enumerate() {
            if !entry.enabled {
                continue;
            }

            let missing = match &entry.settings {
                ProviderSettings::OpenRouter(s) => s.api_key.is_empty(),
                ProviderSettings::MiniMax(s) => s.api_key.is_empty(),
                ProviderSettings::Gemini(s) => s.api_key.is_empty(),
                ProviderSettings::Ollama(_) | ProviderSettings::OpenAiCompatible(_) => false,
            };

            if missing {
                if self.require_keys {
                    return Err(ValidationError::new(
                        format!("providers[{}].api_key", i),
                        ValidationErrorKind::MissingApiKey {
                            provider_type: entry.settings.kind().to_string(),
                        },
                    ));
                }
                warn!("Provider {} has no API key configured", entry.safe_for_logging());
            }
        }

        Ok(())
    }
}
