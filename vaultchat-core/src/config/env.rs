//! Environment variable interpolation for configuration

use super::error::ConfigError;
use regex::{Captures, Regex};
use std::env;
use std::sync::LazyLock;

static ENV_VAR_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\$\{([A-Z_][A-Z0-9_]*)\}").expect("valid env var pattern")
});

/// Interpolate `${VAR}` references in a configuration string
///
/// Every reference must resolve; the first missing variable is reported.
pub fn interpolate_env_vars(content: &str) -> Result<String, ConfigError> {
    if let Some(missing) = ENV_VAR_PATTERN
        .captures_iter(content)
        .map(|cap| cap[1].to_string())
        .find(|name| env::var(name).is_err())
    {
        return Err(ConfigError::EnvVarNotFound { var: missing });
    }

    let result = ENV_VAR_PATTERN.replace_all(content, |cap: &Captures| {
        env::var(&cap[1]).unwrap_or_default()
    });

    Ok(result.into_owned())
}

/// Names of the variables referenced by a configuration string
pub fn referenced_env_vars(content: &str) -> Vec<String> {
    ENV_VAR_PATTERN
        .captures_iter(content)
        .map(|cap| cap[1].to_string())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_interpolate_env_vars() {
        env::set_var("VAULTCHAT_TEST_VAR", "test_value");

        let content = "api_key: ${VAULTCHAT_TEST_VAR}";
        let result = interpolate_env_vars(content).unwrap();
        assert_eq!(result, "api_key: test_value");

        env::remove_var("VAULTCHAT_TEST_VAR");
    }

    #[test]
    fn test_missing_env_var() {
        let content = "api_key: ${VAULTCHAT_MISSING_VAR}";
        let result = interpolate_env_vars(content);

        assert!(result.is_err());
        if let Err(ConfigError::EnvVarNotFound { var }) = result {
            assert_eq!(var, "VAULTCHAT_MISSING_VAR");
        } else {
            panic!("Expected EnvVarNotFound error");
        }
    }

    #[test]
    fn test_multiple_env_vars() {
        env::set_var("VAULTCHAT_VAR1", "value1");
        env::set_var("VAULTCHAT_VAR2", "value2");

        let content = "key1: ${VAULTCHAT_VAR1}, key2: ${VAULTCHAT_VAR2}";
        let result = interpolate_env_vars(content).unwrap();
        assert_eq!(result, "key1: value1, key2: value2");

        env::remove_var("VAULTCHAT_VAR1");
        env::remove_var("VAULTCHAT_VAR2");
    }

    #[test]
    fn test_referenced_env_vars() {
        let vars = referenced_env_vars("a: ${OPENROUTER_API_KEY}\nb: ${GEMINI_API_KEY}\nc: $NOPE");
        assert_eq!(vars, vec!["OPENROUTER_API_KEY", "GEMINI_API_KEY"]);
    }
}
