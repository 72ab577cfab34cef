//! Configuration module for VaultChat
//!
//! Settings arrive either as files (YAML or JSON, with `${VAR}`
//! interpolation) or as the JSON blob the host persists for the plugin.

mod env;
mod error;
pub mod schema;
mod secrets;
mod validator;

pub use env::referenced_env_vars;
pub use error::{ConfigError, ValidationError, ValidationErrorKind};
pub use schema::{
    ChatDefaults, GeminiSettings, GroundingConfig, MiniMaxSettings, OllamaSettings,
    OpenAiCompatibleSettings, OpenRouterSettings, ProviderEntry, ProviderSettings, Region,
    VaultChatConfig, CONFIG_VERSION,
};
pub use secrets::{SafeLogging, SecretString};
pub use validator::ConfigValidator;

use std::fs;
use std::path::Path;

/// Load a configuration from a YAML file
pub fn load_from_yaml<P: AsRef<Path>>(path: P) -> Result<VaultChatConfig, ConfigError> {
    let path = path.as_ref();
    let content = read(path)?;
    parse_yaml(&content, &path.to_string_lossy())
}

/// Load a configuration from a JSON file
pub fn load_from_json<P: AsRef<Path>>(path: P) -> Result<VaultChatConfig, ConfigError> {
    let path = path.as_ref();
    let content = read(path)?;
    parse_json(&content, &path.to_string_lossy())
}

/// Parse settings persisted by the host as a JSON string
pub fn from_json_str(content: &str) -> Result<VaultChatConfig, ConfigError> {
    parse_json(content, "<settings>")
}

/// Parse settings from a YAML string
pub fn from_yaml_str(content: &str) -> Result<VaultChatConfig, ConfigError> {
    parse_yaml(content, "<settings>")
}

fn read(path: &Path) -> Result<String, ConfigError> {
    fs::read_to_string(path).map_err(|e| ConfigError::IoError {
        path: path.to_string_lossy().to_string(),
        source: e,
    })
}

fn parse_yaml(content: &str, origin: &str) -> Result<VaultChatConfig, ConfigError> {
    // Interpolate environment variables before parsing
    let interpolated = env::interpolate_env_vars(content)?;

    let config: VaultChatConfig =
        serde_yaml::from_str(&interpolated).map_err(|e| ConfigError::ParseError {
            path: origin.to_string(),
            line: e.location().map(|l| l.line()),
            column: e.location().map(|l| l.column()),
            message: e.to_string(),
        })?;

    ConfigValidator::new().validate(&config)?;
    Ok(config)
}

fn parse_json(content: &str, origin: &str) -> Result<VaultChatConfig, ConfigError> {
    let interpolated = env::interpolate_env_vars(content)?;

    let config: VaultChatConfig =
        serde_json::from_str(&interpolated).map_err(|e| ConfigError::ParseError {
            path: origin.to_string(),
            line: Some(e.line()),
            column: Some(e.column()),
            message: e.to_string(),
        })?;

    ConfigValidator::new().validate(&config)?;
    Ok(config)
}
