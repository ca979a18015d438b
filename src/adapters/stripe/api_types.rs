//! Stripe API object types.
//!
//! These types represent Stripe objects as returned by the REST API and as
//! embedded in webhook payloads, and their mapping to the gateway port types.

use serde::{Deserialize, Serialize};

use crate::domain::billing::SubscriptionStatus;
use crate::ports::{GatewayCard, GatewayCustomer, GatewayEvent, GatewayInvoice, GatewaySubscription};

/// Stripe Customer object.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StripeCustomer {
    /// Unique customer identifier (cus_...).
    pub id: String,

    /// Customer email address.
    pub email: Option<String>,

    /// Unix timestamp of creation.
    #[serde(default)]
    pub created: i64,

    /// Whether the customer has been deleted.
    #[serde(default)]
    pub deleted: bool,

    /// Card currently on file.
    pub active_card: Option<StripeCard>,

    /// The customer's subscription, when expanded in the response.
    pub subscription: Option<StripeSubscription>,
}

impl StripeCustomer {
    /// Maps to the gateway port type.
    pub fn into_gateway(self) -> GatewayCustomer {
        let id = self.id;
        GatewayCustomer {
            email: self.email,
            active_card: self.active_card.map(StripeCard::into_gateway),
            subscription: self
                .subscription
                .map(|s| s.into_gateway_for_customer(&id)),
            created: self.created,
            id,
        }
    }
}

/// Stripe Card object.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StripeCard {
    /// Stable fingerprint of the card number.
    pub fingerprint: String,

    /// Last four digits.
    pub last4: String,

    /// Card brand. Older API versions call this `type`.
    #[serde(rename = "type", alias = "brand")]
    pub kind: String,
}

impl StripeCard {
    /// Maps to the gateway port type.
    pub fn into_gateway(self) -> GatewayCard {
        GatewayCard {
            fingerprint: self.fingerprint,
            last_4: self.last4,
            brand: self.kind,
        }
    }
}

/// Stripe Plan object (embedded in subscriptions).
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StripePlan {
    /// Plan identifier.
    pub id: String,

    /// Per-interval amount in cents.
    pub amount: Option<i64>,

    /// Currency (lowercase).
    #[serde(default = "default_currency")]
    pub currency: String,

    /// Billing interval (month, year).
    pub interval: Option<String>,
}

fn default_currency() -> String {
    "usd".to_string()
}

/// Stripe Subscription object.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StripeSubscription {
    /// Unique subscription identifier (sub_...).
    pub id: String,

    /// Owning customer id. Absent when nested inside a customer response.
    pub customer: Option<String>,

    /// The subscribed plan.
    pub plan: StripePlan,

    /// Subscribed quantity.
    #[serde(default = "default_quantity")]
    pub quantity: i64,

    /// Subscription status string.
    pub status: String,

    /// Current period start (Unix timestamp).
    pub current_period_start: i64,

    /// Current period end (Unix timestamp).
    pub current_period_end: i64,

    /// Whether the subscription cancels at period end.
    #[serde(default)]
    pub cancel_at_period_end: bool,

    /// When cancellation was requested (Unix timestamp).
    pub canceled_at: Option<i64>,

    /// When the subscription started (Unix timestamp).
    #[serde(default)]
    pub start: i64,
}

fn default_quantity() -> i64 {
    1
}

impl StripeSubscription {
    /// Maps to the gateway port type, supplying the customer id for nested
    /// responses that omit it.
    pub fn into_gateway_for_customer(self, customer_id: &str) -> GatewaySubscription {
        let start = if self.start != 0 {
            self.start
        } else {
            self.current_period_start
        };
        GatewaySubscription {
            id: self.id,
            customer_id: self
                .customer
                .unwrap_or_else(|| customer_id.to_string()),
            plan_id: self.plan.id,
            quantity: self.quantity,
            status: SubscriptionStatus::parse(&self.status),
            current_period_start: self.current_period_start,
            current_period_end: self.current_period_end,
            amount_cents: self.plan.amount.unwrap_or(0),
            currency: self.plan.currency,
            cancel_at_period_end: self.cancel_at_period_end,
            canceled_at: self.canceled_at,
            start,
        }
    }
}

/// Stripe Invoice object.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StripeInvoice {
    /// Unique invoice identifier (in_...).
    pub id: String,

    /// Owning customer id.
    pub customer: String,

    /// Invoice total in cents.
    #[serde(default)]
    pub total: i64,

    /// Currency (lowercase).
    #[serde(default = "default_currency")]
    pub currency: String,

    /// Whether the invoice has been paid.
    #[serde(default)]
    pub paid: bool,

    /// Whether a payment attempt has been made.
    #[serde(default)]
    pub attempted: bool,

    /// Creation time. Older API versions call this `date`.
    #[serde(default, alias = "date")]
    pub created: i64,
}

impl StripeInvoice {
    /// Maps to the gateway port type.
    pub fn into_gateway(self) -> GatewayInvoice {
        GatewayInvoice {
            id: self.id,
            customer_id: self.customer,
            amount_cents: self.total,
            currency: self.currency,
            paid: self.paid,
            attempted: self.attempted,
            created: self.created,
        }
    }
}

/// Stripe Event envelope as returned by the events endpoint.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StripeEventEnvelope {
    /// Unique event identifier (evt_...).
    pub id: String,

    /// Event kind (e.g. "invoice.paid").
    #[serde(rename = "type")]
    pub kind: String,

    /// Whether this is a live or test event.
    pub livemode: bool,

    /// Event payload containing the affected object.
    pub data: serde_json::Value,

    /// Unix timestamp when the event was created.
    #[serde(default)]
    pub created: i64,
}

impl StripeEventEnvelope {
    /// Maps to the gateway port type.
    pub fn into_gateway(self) -> GatewayEvent {
        GatewayEvent {
            id: self.id,
            kind: self.kind,
            livemode: self.livemode,
            data: self.data,
            created: self.created,
        }
    }
}

/// Paginated list container.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StripeList<T> {
    #[serde(default = "Vec::new")]
    pub data: Vec<T>,
}

/// Error body returned by the Stripe API.
#[derive(Debug, Clone, Deserialize)]
pub struct StripeErrorBody {
    pub error: StripeErrorDetail,
}

/// Error detail inside an error body.
#[derive(Debug, Clone, Deserialize)]
pub struct StripeErrorDetail {
    /// Error category (card_error, invalid_request_error, api_error).
    #[serde(rename = "type")]
    pub kind: Option<String>,

    /// Human-readable message.
    pub message: Option<String>,

    /// Machine-readable code (e.g. "card_declined").
    pub code: Option<String>,
}
