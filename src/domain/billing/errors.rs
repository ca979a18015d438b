//! Billing domain errors.

use thiserror::Error;

use crate::domain::foundation::DomainError;

/// Errors raised by billing command handlers.
///
/// Processor failures carry the processor's message so views can surface it
/// as a form-level error. Both subscribe and change-plan use this single
/// policy; nothing is re-raised past the handler boundary.
#[derive(Debug, Clone, Error)]
pub enum BillingError {
    #[error("Unknown plan: {0}")]
    UnknownPlan(String),

    #[error("No billing record for user {0}")]
    CustomerNotFound(String),

    #[error("No subscription on record")]
    SubscriptionNotFound,

    #[error("No card on file")]
    NoCardOnFile,

    /// Processor rejected the operation. `declined` distinguishes card
    /// declines from other processor failures.
    #[error("{message}")]
    Processor { message: String, declined: bool },

    #[error(transparent)]
    Repository(#[from] DomainError),
}

impl BillingError {
    /// Creates a processor error that should be surfaced to the form.
    pub fn processor(message: impl Into<String>) -> Self {
        BillingError::Processor {
            message: message.into(),
            declined: false,
        }
    }

    /// Creates a card-declined error.
    pub fn card_declined(message: impl Into<String>) -> Self {
        BillingError::Processor {
            message: message.into(),
            declined: true,
        }
    }

    /// Whether this error should be rendered as a form-level message
    /// rather than a server failure.
    pub fn is_form_error(&self) -> bool {
        matches!(
            self,
            BillingError::UnknownPlan(_)
                | BillingError::NoCardOnFile
                | BillingError::Processor { .. }
        )
    }
}
