//! Configuration error types

use thiserror::Error;

/// Errors that occur while loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Underlying config crate error (missing variable, type mismatch).
    #[error("configuration error: {0}")]
    Load(#[from] config::ConfigError),
}

/// Errors that occur while validating loaded configuration.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("missing required configuration value: {0}")]
    MissingRequired(&'static str),

    #[error("server port must be non-zero")]
    InvalidPort,

    #[error("request timeout must be between 1 and 300 seconds")]
    InvalidTimeout,

    #[error("database URL must start with postgres:// or postgresql://")]
    InvalidDatabaseUrl,

    #[error("database pool size must be between 1 and 100")]
    InvalidPoolSize,

    #[error("processor secret key must start with sk_")]
    InvalidProcessorKey,

    #[error("webhook signing secret must start with whsec_")]
    InvalidWebhookSecret,

    #[error("auth token secret must be at least 32 bytes")]
    WeakTokenSecret,

    #[error("plan catalog must contain at least one plan")]
    EmptyPlanCatalog,

    #[error("webhook path must start with '/'")]
    InvalidWebhookPath,
}
