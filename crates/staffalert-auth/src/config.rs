//! Authorizer configuration.

use serde::{Deserialize, Serialize};

/// Authorizer configuration.
///
/// # Example (TOML)
///
/// ```toml
/// [auth]
/// token = "change-me"
/// resource_prefix = "arn:aws:execute-api:eu-west-1:123456789012:staff-alert/dev"
/// ```
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AuthConfig {
    /// Shared secret callers must present in the `Authorization` header.
    /// Compared exactly and case-sensitively.
    pub token: String,

    /// Prefix of the resource identifiers built for guarded routes.
    /// A request `POST /notification` is authorized against
    /// `{resource_prefix}/POST/notification`.
    pub resource_prefix: String,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            token: String::new(),
            resource_prefix: "arn:aws:execute-api:local:000000000000:staff-alert/dev".to_string(),
        }
    }
}

impl AuthConfig {
    /// Builds the resource identifier for a request method and path.
    pub fn method_arn(&self, method: &str, path: &str) -> String {
        method_arn(&self.resource_prefix, method, path)
    }

    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the token or the resource prefix is empty.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.token.is_empty() {
            return Err(ConfigError::MissingValue("auth.token".to_string()));
        }
        if self.resource_prefix.is_empty() {
            return Err(ConfigError::MissingValue("auth.resource_prefix".to_string()));
        }
        if self.resource_prefix.ends_with('/') {
            return Err(ConfigError::InvalidValue(
                "auth.resource_prefix must not end with '/'".to_string(),
            ));
        }
        Ok(())
    }
}

pub(crate) fn method_arn(prefix: &str, method: &str, path: &str) -> String {
    format!("{}/{}{}", prefix, method, path)
}

/// Configuration validation errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// An invalid configuration value was provided.
    #[error("Invalid configuration value: {0}")]
    InvalidValue(String),

    /// A required configuration value is missing.
    #[error("Missing required configuration: {0}")]
    MissingValue(String),
}
