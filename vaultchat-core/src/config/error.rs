//! Errors raised while loading and validating chat settings

use std::fmt;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read settings from '{path}': {source}")]
    IoError {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed settings in '{path}' at line {}, column {}: {message}",
            .line.unwrap_or(0), .column.unwrap_or(0))]
    ParseError {
        path: String,
        line: Option<usize>,
        column: Option<usize>,
        message: String,
    },

    #[error("invalid settings: {0}")]
    ValidationError(#[from] ValidationError),

    #[error("environment variable '{var}' referenced as ${{{var}}} is not set")]
    EnvVarNotFound { var: String },
}

/// A rejected setting, addressed by its path (e.g. `providers[0].base_url`)
#[derive(Debug, Error)]
pub struct ValidationError {
    pub field_path: String,
    pub kind: ValidationErrorKind,
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "'{}': {}", self.field_path, self.kind)
    }
}

#[derive(Debug, Error)]
pub enum ValidationErrorKind {
    #[error("required field is missing")]
    RequiredFieldMissing,

    #[error("{provider_type} provider needs an API key")]
    MissingApiKey { provider_type: String },

    #[error("value out of range: {message}")]
    OutOfRange { message: String },

    #[error("provider id '{id}' is used more than once")]
    DuplicateProviderId { id: String },

    #[error("no provider with id '{id}'")]
    UnknownProvider { id: String },

    #[error("provider '{id}' is disabled")]
    ProviderDisabled { id: String },

    #[error("invalid URL: {message}")]
    InvalidUrl { message: String },

    #[error("settings version '{found}' is not supported (expected '{supported}')")]
    UnsupportedVersion { supported: String, found: String },
}

impl ValidationError {
    pub fn new(field_path: impl Into<String>, kind: ValidationErrorKind) -> Self {
        Self {
            field_path: field_path.into(),
            kind,
        }
    }

    pub fn required(field_path: impl Into<String>) -> Self {
        Self::new(field_path, ValidationErrorKind::RequiredFieldMissing)
    }

    pub fn out_of_range(field_path: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(
            field_path,
            ValidationErrorKind::OutOfRange {
                message: message.into(),
            },
        )
    }
}
