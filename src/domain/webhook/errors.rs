//! Webhook processing errors.

use thiserror::Error;

use crate::domain::foundation::DomainError;

/// Errors raised while receiving, validating, or applying a webhook event.
///
/// None of these bubble to the HTTP response status: the webhook endpoint
/// always acknowledges the delivery. They determine what gets recorded.
#[derive(Debug, Clone, Error)]
pub enum WebhookError {
    /// The request body is not a well-formed event envelope.
    #[error("malformed webhook payload: {0}")]
    MalformedPayload(String),

    /// The event could not be confirmed against the processor.
    #[error("event failed validation: {0}")]
    Validation(String),

    /// A handler acknowledged the event but chose not to act on it.
    #[error("event ignored: {0}")]
    Ignored(String),

    /// A handler failed while applying the event's effect.
    #[error("event handler failed: {0}")]
    Handler(String),

    /// Storage failure while recording the event.
    #[error("storage failure: {0}")]
    Database(String),
}

impl From<DomainError> for WebhookError {
    fn from(err: DomainError) -> Self {
        WebhookError::Database(err.to_string())
    }
}
