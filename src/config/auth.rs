//! Authentication configuration

use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;

use super::error::ValidationError;

/// Authentication configuration (bearer tokens, HS256)
#[derive(Debug, Clone, Deserialize)]
pub struct AuthConfig {
    /// Shared secret for signing/verifying session tokens
    pub token_secret: SecretString,

    /// Expected token issuer
    #[serde(default = "default_issuer")]
    pub issuer: String,
}

impl AuthConfig {
    /// Validate authentication configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.token_secret.expose_secret().is_empty() {
            return Err(ValidationError::MissingRequired("AUTH__TOKEN_SECRET"));
        }
        if self.token_secret.expose_secret().len() < 32 {
            return Err(ValidationError::WeakTokenSecret);
        }
        Ok(())
    }
}

fn default_issuer() -> String {
    "donation-gateway".to_string()
}
