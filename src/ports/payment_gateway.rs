//! Payment gateway port for external payment processing.
//!
//! Defines the contract for the payment processor integration (e.g. Stripe).
//! Implementations handle customer and card management, subscriptions,
//! invoicing, and event retrieval for webhook validation.
//!
//! # Design
//!
//! - **Gateway agnostic**: the interface works with any processor that has
//!   customers, cards, invoices, subscriptions, and webhook events
//! - **Thin**: the gateway performs no local persistence; callers decide
//!   what to mirror into storage

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::domain::billing::{BillingError, SubscriptionStatus};

/// Port for the payment processor integration.
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// Create a customer in the payment system.
    ///
    /// When `card_token` is set, the card is attached immediately. When
    /// `plan` is set, the customer is subscribed on creation (used by the
    /// recurring donation flow).
    async fn create_customer(
        &self,
        request: CreateCustomerRequest,
    ) -> Result<GatewayCustomer, GatewayError>;

    /// Get a customer by processor id. Returns `None` for deleted/unknown.
    async fn retrieve_customer(
        &self,
        customer_id: &str,
    ) -> Result<Option<GatewayCustomer>, GatewayError>;

    /// Replace the customer's stored card with a new token.
    ///
    /// Returns the card details as reported back by the processor.
    async fn update_card(
        &self,
        customer_id: &str,
        card_token: &str,
    ) -> Result<GatewayCard, GatewayError>;

    /// Create or replace the customer's subscription.
    async fn create_subscription(
        &self,
        request: CreateSubscriptionRequest,
    ) -> Result<GatewaySubscription, GatewayError>;

    /// Cancel the customer's subscription.
    ///
    /// If `at_period_end` is true, the subscription remains active until the
    /// current billing period ends.
    async fn cancel_subscription(
        &self,
        customer_id: &str,
        at_period_end: bool,
    ) -> Result<GatewaySubscription, GatewayError>;

    /// Create a pending invoice item for the customer.
    async fn create_invoice_item(
        &self,
        request: CreateInvoiceItemRequest,
    ) -> Result<String, GatewayError>;

    /// Create an invoice collecting the customer's pending invoice items.
    async fn create_invoice(
        &self,
        customer_id: &str,
        description: &str,
    ) -> Result<GatewayInvoice, GatewayError>;

    /// Attempt payment of an invoice.
    async fn pay_invoice(&self, invoice_id: &str) -> Result<GatewayInvoice, GatewayError>;

    /// List the customer's invoices, newest first.
    async fn list_invoices(&self, customer_id: &str) -> Result<Vec<GatewayInvoice>, GatewayError>;

    /// Re-fetch a webhook event by id for validation.
    ///
    /// Returns `None` when the processor does not know the event (a forged
    /// or garbled delivery).
    async fn retrieve_event(&self, event_id: &str) -> Result<Option<GatewayEvent>, GatewayError>;
}

/// Request to create a processor customer.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CreateCustomerRequest {
    /// Customer email address.
    pub email: String,

    /// Human-readable description shown in the processor dashboard.
    pub description: String,

    /// Card token to attach on creation.
    pub card_token: Option<String>,

    /// Processor plan id to subscribe to on creation.
    pub plan: Option<String>,

    /// Subscription quantity (only meaningful with `plan`).
    pub quantity: Option<i64>,

    /// Free-form metadata stored with the customer.
    pub metadata: HashMap<String, String>,
}

/// Customer in the payment system.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayCustomer {
    /// Processor customer id (cus_...).
    pub id: String,

    pub email: Option<String>,

    /// Card currently on file, if any.
    pub active_card: Option<GatewayCard>,

    /// Subscription created alongside the customer, if any.
    pub subscription: Option<GatewaySubscription>,

    /// Creation time (Unix seconds, processor clock).
    pub created: i64,
}

/// Card details as reported by the processor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GatewayCard {
    /// Stable fingerprint of the card number.
    pub fingerprint: String,

    /// Last four digits.
    pub last_4: String,

    /// Card brand (e.g. "Visa").
    pub brand: String,
}

/// Request to create or replace a subscription.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateSubscriptionRequest {
    /// Processor customer id.
    pub customer_id: String,

    /// Processor plan id.
    pub plan_id: String,

    /// Subscribed quantity.
    pub quantity: i64,
}

/// Subscription in the payment system.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewaySubscription {
    /// Processor subscription id (sub_...).
    pub id: String,

    /// Owning processor customer id.
    pub customer_id: String,

    /// Processor plan id.
    pub plan_id: String,

    pub quantity: i64,

    pub status: SubscriptionStatus,

    /// Current billing period boundaries (Unix seconds).
    pub current_period_start: i64,
    pub current_period_end: i64,

    /// Per-period amount in cents.
    pub amount_cents: i64,

    /// ISO currency code, lowercase.
    pub currency: String,

    pub cancel_at_period_end: bool,

    /// When cancellation was requested (Unix seconds).
    pub canceled_at: Option<i64>,

    /// When the subscription started (Unix seconds).
    pub start: i64,
}

/// Request to create an invoice item.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateInvoiceItemRequest {
    /// Processor customer id.
    pub customer_id: String,

    /// Amount in cents.
    pub amount_cents: i64,

    /// ISO currency code, lowercase.
    pub currency: String,

    pub description: String,

    /// Free-form metadata stored with the item.
    pub metadata: HashMap<String, String>,
}

/// Invoice in the payment system.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayInvoice {
    /// Processor invoice id (in_...).
    pub id: String,

    /// Owning processor customer id.
    pub customer_id: String,

    /// Total in cents.
    pub amount_cents: i64,

    /// ISO currency code, lowercase.
    pub currency: String,

    /// Whether the invoice has been paid.
    pub paid: bool,

    /// Whether a payment attempt has been made.
    pub attempted: bool,

    /// Creation time (Unix seconds).
    pub created: i64,
}

/// Webhook event as re-fetched from the processor for validation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayEvent {
    /// Processor event id (evt_...).
    pub id: String,

    /// Event kind string.
    pub kind: String,

    pub livemode: bool,

    /// The `data` member of the event envelope.
    pub data: serde_json::Value,

    /// Creation time (Unix seconds).
    pub created: i64,
}

/// Errors from payment gateway operations.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayError {
    /// Error code for categorization.
    pub code: GatewayErrorCode,

    /// Human-readable message, suitable for form-level display.
    pub message: String,

    /// Whether the operation can be retried.
    pub retryable: bool,
}

impl GatewayError {
    /// Create a new gateway error.
    pub fn new(code: GatewayErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            retryable: code.is_retryable(),
        }
    }

    /// Create a network error.
    pub fn network(message: impl Into<String>) -> Self {
        Self::new(GatewayErrorCode::NetworkError, message)
    }

    /// Create a card declined error.
    pub fn card_declined(message: impl Into<String>) -> Self {
        Self::new(GatewayErrorCode::CardDeclined, message)
    }

    /// Create a not found error.
    pub fn not_found(resource: &str) -> Self {
        Self::new(
            GatewayErrorCode::NotFound,
            format!("{} not found", resource),
        )
    }

    /// Create a processor API error.
    pub fn api(message: impl Into<String>) -> Self {
        Self::new(GatewayErrorCode::ApiError, message)
    }
}

impl std::fmt::Display for GatewayError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.code, self.message)
    }
}

impl std::error::Error for GatewayError {}

impl From<GatewayError> for BillingError {
    fn from(err: GatewayError) -> Self {
        if err.code == GatewayErrorCode::CardDeclined {
            BillingError::card_declined(err.message)
        } else {
            BillingError::processor(err.message)
        }
    }
}

/// Gateway error codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GatewayErrorCode {
    /// Network connectivity issue.
    NetworkError,

    /// API authentication failed.
    AuthenticationError,

    /// Card was declined.
    CardDeclined,

    /// Request was rejected as invalid.
    InvalidRequest,

    /// Resource not found.
    NotFound,

    /// Rate limit exceeded.
    RateLimitExceeded,

    /// Processor-side failure.
    ApiError,

    /// Unknown error.
    Unknown,
}

impl GatewayErrorCode {
    /// Check if this error type is typically retryable.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            GatewayErrorCode::NetworkError | GatewayErrorCode::RateLimitExceeded
        )
    }
}

impl std::fmt::Display for GatewayErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            GatewayErrorCode::NetworkError => "network_error",
            GatewayErrorCode::AuthenticationError => "authentication_error",
            GatewayErrorCode::CardDeclined => "card_declined",
            GatewayErrorCode::InvalidRequest => "invalid_request",
            GatewayErrorCode::NotFound => "not_found",
            GatewayErrorCode::RateLimitExceeded => "rate_limit_exceeded",
            GatewayErrorCode::ApiError => "api_error",
            GatewayErrorCode::Unknown => "unknown",
        };
        write!(f, "{}", s)
    }
}
