//! Payment processor configuration

use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;

use super::error::ValidationError;

/// Payment processor configuration (Stripe)
#[derive(Debug, Clone, Deserialize)]
pub struct PaymentConfig {
    /// Processor secret API key (sk_live_... or sk_test_...)
    pub secret_key: SecretString,

    /// Webhook signing secret (whsec_...). When absent, incoming webhooks
    /// are authenticated by re-fetching the event from the processor only.
    pub webhook_secret: Option<SecretString>,

    /// Path the webhook endpoint is mounted at
    #[serde(default = "default_webhook_path")]
    pub webhook_path: String,

    /// Base URL for the processor API
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,

    /// Plan code used for recurring donations (quantity = donated units)
    #[serde(default = "default_donation_plan")]
    pub donation_plan: String,
}

impl PaymentConfig {
    /// Check if using processor test mode
    pub fn is_test_mode(&self) -> bool {
        self.secret_key.expose_secret().starts_with("sk_test_")
    }

    /// Check if using processor live mode
    pub fn is_live_mode(&self) -> bool {
        self.secret_key.expose_secret().starts_with("sk_live_")
    }

    /// Validate payment configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.secret_key.expose_secret().is_empty() {
            return Err(ValidationError::MissingRequired("PAYMENT__SECRET_KEY"));
        }
        if !self.secret_key.expose_secret().starts_with("sk_") {
            return Err(ValidationError::InvalidProcessorKey);
        }
        if let Some(secret) = &self.webhook_secret {
            if !secret.expose_secret().starts_with("whsec_") {
                return Err(ValidationError::InvalidWebhookSecret);
            }
        }
        if !self.webhook_path.starts_with('/') {
            return Err(ValidationError::InvalidWebhookPath);
        }
        Ok(())
    }
}

fn default_webhook_path() -> String {
    "/webhook/".to_string()
}

fn default_api_base_url() -> String {
    "https://api.stripe.com".to_string()
}

fn default_donation_plan() -> String {
    "donation-monthly".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_config() -> PaymentConfig {
        PaymentConfig {
            secret_key: SecretString::new("sk_test_abcd1234".to_string()),
            webhook_secret: Some(SecretString::new("whsec_xyz789".to_string())),
            webhook_path: default_webhook_path(),
            api_base_url: default_api_base_url(),
            donation_plan: default_donation_plan(),
        }
    }

    #[test]
    fn is_test_mode() {
        assert!(valid_config().is_test_mode());
        assert!(!valid_config().is_live_mode());
    }

    #[test]
    fn valid_config_passes() {
        assert!(valid_config().validate().is_ok());
    }

    #[test]
    fn wrong_key_prefix_is_rejected() {
        let config = PaymentConfig {
            secret_key: SecretString::new("pk_test_abcd".to_string()),
            ..valid_config()
        };
        assert_eq!(config.validate(), Err(ValidationError::InvalidProcessorKey));
    }

    #[test]
    fn wrong_webhook_secret_prefix_is_rejected() {
        let config = PaymentConfig {
            webhook_secret: Some(SecretString::new("secret_xyz".to_string())),
            ..valid_config()
        };
        assert_eq!(config.validate(), Err(ValidationError::InvalidWebhookSecret));
    }

    #[test]
    fn missing_webhook_secret_is_allowed() {
        let config = PaymentConfig {
            webhook_secret: None,
            ..valid_config()
        };
        assert!(config.validate().is_ok());
    }

    #[test]
    fn relative_webhook_path_is_rejected() {
        let config = PaymentConfig {
            webhook_path: "webhook/".to_string(),
            ..valid_config()
        };
        assert_eq!(config.validate(), Err(ValidationError::InvalidWebhookPath));
    }
}
