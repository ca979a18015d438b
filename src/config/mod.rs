//! Application configuration module
//!
//! This module provides type-safe configuration loading from environment
//! variables using the `config` and `dotenvy` crates. Configuration is loaded
//! with the `DONATION_GATEWAY` prefix and nested values use double
//! underscores as separators.
//!
//! # Example
//!
//! ```no_run
//! use donation_gateway::config::AppConfig;
//!
//! let config = AppConfig::load().expect("Failed to load configuration");
//! config.validate().expect("Invalid configuration");
//!
//! println!("Server running on {}", config.server.socket_addr());
//! ```

mod auth;
mod database;
mod error;
mod payment;
mod server;

pub use auth::AuthConfig;
pub use database::DatabaseConfig;
pub use error::{ConfigError, ValidationError};
pub use payment::PaymentConfig;
pub use server::{Environment, ServerConfig};

use serde::Deserialize;

/// Root application configuration
///
/// Contains all configuration sections for the donation gateway. Load using
/// [`AppConfig::load()`] which reads from environment variables; the loaded
/// struct is passed explicitly into the application at startup.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Server configuration (host, port, environment)
    #[serde(default)]
    pub server: ServerConfig,

    /// Database configuration (PostgreSQL connection)
    pub database: DatabaseConfig,

    /// Authentication configuration (bearer tokens)
    pub auth: AuthConfig,

    /// Payment processor configuration (Stripe)
    pub payment: PaymentConfig,
}

impl AppConfig {
    /// Load configuration from environment variables
    ///
    /// This function:
    /// 1. Loads `.env` file if present (for development)
    /// 2. Reads environment variables with `DONATION_GATEWAY` prefix
    /// 3. Uses `__` (double underscore) to separate nested values
    /// 4. Deserializes into typed configuration structs
    ///
    /// # Environment Variable Format
    ///
    /// - `DONATION_GATEWAY__SERVER__PORT=8080` -> `server.port = 8080`
    /// - `DONATION_GATEWAY__DATABASE__URL=...` -> `database.url = ...`
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required environment variables are missing
    /// or values cannot be parsed into expected types.
    pub fn load() -> Result<Self, ConfigError> {
        // Load .env file if present (development)
        dotenvy::dotenv().ok();

        let config = config::Config::builder()
            .add_source(
                config::Environment::default()
                    .prefix("DONATION_GATEWAY")
                    .separator("__"),
            )
            .build()?
            .try_deserialize()?;

        Ok(config)
    }

    /// Validate all configuration values
    ///
    /// # Errors
    ///
    /// Returns `ValidationError` if any configuration value is invalid.
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.server.validate()?;
        self.database.validate()?;
        self.auth.validate()?;
        self.payment.validate()?;
        Ok(())
    }

    /// Check if running in production environment
    pub fn is_production(&self) -> bool {
        self.server.is_production()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;
    use std::sync::Mutex;

    // Mutex to ensure tests don't run in parallel (env vars are global)
    static ENV_MUTEX: Mutex<()> = Mutex::new(());

    fn set_minimal_env() {
        env::set_var(
            "DONATION_GATEWAY__DATABASE__URL",
            "postgresql://test@localhost/test",
        );
        env::set_var(
            "DONATION_GATEWAY__AUTH__TOKEN_SECRET",
            "0123456789abcdef0123456789abcdef",
        );
        env::set_var("DONATION_GATEWAY__PAYMENT__SECRET_KEY", "sk_test_xxx");
        env::set_var("DONATION_GATEWAY__PAYMENT__WEBHOOK_SECRET", "whsec_xxx");
    }

    fn clear_env() {
        env::remove_var("DONATION_GATEWAY__DATABASE__URL");
        env::remove_var("DONATION_GATEWAY__AUTH__TOKEN_SECRET");
        env::remove_var("DONATION_GATEWAY__PAYMENT__SECRET_KEY");
        env::remove_var("DONATION_GATEWAY__PAYMENT__WEBHOOK_SECRET");
        env::remove_var("DONATION_GATEWAY__SERVER__PORT");
        env::remove_var("DONATION_GATEWAY__SERVER__ENVIRONMENT");
        env::remove_var("DONATION_GATEWAY__PAYMENT__WEBHOOK_PATH");
    }

    #[test]
    fn load_from_environment() {
        let _guard = ENV_MUTEX.lock().unwrap();
        set_minimal_env();
        let result = AppConfig::load();
        clear_env();

        assert!(result.is_ok(), "Failed to load config: {:?}", result.err());
        let config = result.unwrap();
        assert_eq!(config.database.url, "postgresql://test@localhost/test");
        assert_eq!(config.payment.webhook_path, "/webhook/");
    }

    #[test]
    fn validate_full_config() {
        let _guard = ENV_MUTEX.lock().unwrap();
        set_minimal_env();
        let result = AppConfig::load();
        clear_env();

        assert!(result.is_ok());
        let config = result.unwrap();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn server_defaults() {
        let _guard = ENV_MUTEX.lock().unwrap();
        set_minimal_env();
        let result = AppConfig::load();
        clear_env();

        let config = result.unwrap();
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.server.environment, Environment::Development);
    }

    #[test]
    fn custom_webhook_path() {
        let _guard = ENV_MUTEX.lock().unwrap();
        set_minimal_env();
        env::set_var("DONATION_GATEWAY__PAYMENT__WEBHOOK_PATH", "/hooks/processor/");
        let result = AppConfig::load();
        clear_env();

        let config = result.unwrap();
        assert_eq!(config.payment.webhook_path, "/hooks/processor/");
    }

    #[test]
    fn is_production() {
        let _guard = ENV_MUTEX.lock().unwrap();
        set_minimal_env();
        env::set_var("DONATION_GATEWAY__SERVER__ENVIRONMENT", "production");
        let result = AppConfig::load();
        clear_env();

        let config = result.unwrap();
        assert!(config.is_production());
    }
}
