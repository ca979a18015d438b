//! API error mapping.
//!
//! Translates domain and billing errors into HTTP responses. Form-level
//! errors (invalid plan, processor rejections) become 422 responses whose
//! message is meant to be rendered back into the form.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::domain::billing::BillingError;
use crate::domain::foundation::{DomainError, ErrorCode, ValidationError};

/// JSON body of every error response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Machine-readable error code.
    pub error: String,

    /// Human-readable message.
    pub message: String,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            message: message.into(),
        }
    }
}

/// Error type returned by HTTP handlers.
#[derive(Debug, Clone)]
pub struct ApiError {
    pub status: StatusCode,
    pub code: &'static str,
    pub message: String,
}

impl ApiError {
    pub fn new(status: StatusCode, code: &'static str, message: impl Into<String>) -> Self {
        Self {
            status,
            code,
            message: message.into(),
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, "BAD_REQUEST", message)
    }

    /// A form-level error: the message is rendered back to the user.
    pub fn form_error(message: impl Into<String>) -> Self {
        Self::new(StatusCode::UNPROCESSABLE_ENTITY, "FORM_ERROR", message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, "NOT_FOUND", message)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ErrorResponse::new(self.code, self.message);
        (self.status, Json(body)).into_response()
    }
}

impl From<BillingError> for ApiError {
    fn from(err: BillingError) -> Self {
        match &err {
            BillingError::UnknownPlan(_) | BillingError::NoCardOnFile => {
                ApiError::form_error(err.to_string())
            }
            BillingError::Processor { declined, message } => ApiError::new(
                StatusCode::UNPROCESSABLE_ENTITY,
                if *declined { "CARD_DECLINED" } else { "PROCESSOR_ERROR" },
                message.clone(),
            ),
            BillingError::CustomerNotFound(_) | BillingError::SubscriptionNotFound => {
                ApiError::not_found(err.to_string())
            }
            BillingError::Repository(domain) => domain.clone().into(),
        }
    }
}

impl From<DomainError> for ApiError {
    fn from(err: DomainError) -> Self {
        let (status, code) = match err.code {
            ErrorCode::ValidationFailed | ErrorCode::EmptyField | ErrorCode::InvalidFormat => {
                (StatusCode::BAD_REQUEST, "VALIDATION_FAILED")
            }
            ErrorCode::Unauthorized => (StatusCode::UNAUTHORIZED, "UNAUTHORIZED"),
            ErrorCode::Forbidden => (StatusCode::FORBIDDEN, "FORBIDDEN"),
            ErrorCode::CustomerNotFound
            | ErrorCode::SubscriptionNotFound
            | ErrorCode::PlanNotFound => (StatusCode::NOT_FOUND, "NOT_FOUND"),
            _ => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
        };
        ApiError::new(status, code, err.message)
    }
}

impl From<ValidationError> for ApiError {
    fn from(err: ValidationError) -> Self {
        ApiError::bad_request(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn processor_errors_are_unprocessable() {
        let api: ApiError = BillingError::processor("Card expired").into();
        assert_eq!(api.status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(api.code, "PROCESSOR_ERROR");
        assert_eq!(api.message, "Card expired");
    }

    #[test]
    fn declines_carry_their_own_code() {
        let api: ApiError = BillingError::card_declined("Do not honor").into();
        assert_eq!(api.code, "CARD_DECLINED");
    }

    #[test]
    fn missing_customer_is_not_found() {
        let api: ApiError = BillingError::CustomerNotFound("u1".to_string()).into();
        assert_eq!(api.status, StatusCode::NOT_FOUND);
    }

    #[test]
    fn infrastructure_errors_are_internal() {
        let api: ApiError =
            DomainError::new(ErrorCode::DatabaseError, "connection lost").into();
        assert_eq!(api.status, StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn unknown_plan_is_a_form_error() {
        let api: ApiError = BillingError::UnknownPlan("gold".to_string()).into();
        assert_eq!(api.status, StatusCode::UNPROCESSABLE_ENTITY);
        assert!(api.message.contains("gold"));
    }
}
