//! Incoming processor webhook events.
//!
//! An [`IncomingEvent`] is the parsed envelope of a single webhook delivery.
//! The processor pushes these with at-least-once semantics, so the same
//! event id may arrive any number of times; deduplication happens in the
//! [`super::WebhookProcessor`].

use serde_json::Value;

use super::WebhookError;

/// Event kinds this service reacts to.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum EventKind {
    SubscriptionCreated,
    SubscriptionUpdated,
    SubscriptionDeleted,
    InvoicePaymentSucceeded,
    InvoicePaymentFailed,
    InvoicePaid,
    /// Any kind we have no handler for. Recorded and acknowledged, no effect.
    Other(String),
}

impl EventKind {
    /// Parses a processor kind string (e.g. "customer.subscription.deleted").
    pub fn parse(kind: &str) -> Self {
        match kind {
            "customer.subscription.created" => EventKind::SubscriptionCreated,
            "customer.subscription.updated" => EventKind::SubscriptionUpdated,
            "customer.subscription.deleted" => EventKind::SubscriptionDeleted,
            "invoice.payment_succeeded" => EventKind::InvoicePaymentSucceeded,
            "invoice.payment_failed" => EventKind::InvoicePaymentFailed,
            "invoice.paid" => EventKind::InvoicePaid,
            other => EventKind::Other(other.to_string()),
        }
    }
}

/// A single webhook delivery, parsed from the request body.
#[derive(Debug, Clone, PartialEq)]
pub struct IncomingEvent {
    /// Processor event id (evt_...). Unique per event, not per delivery.
    pub id: String,

    /// Kind string as sent by the processor.
    pub kind: String,

    /// Whether the event originated in live mode.
    pub livemode: bool,

    /// The `data` member of the envelope (contains the affected object).
    pub data: Value,

    /// The full message body as received.
    pub payload: Value,
}

impl IncomingEvent {
    /// Parses a webhook body. Requires `id`, `type`, and `livemode`.
    pub fn parse(payload: Value) -> Result<Self, WebhookError> {
        let id = payload
            .get("id")
            .and_then(Value::as_str)
            .ok_or_else(|| WebhookError::MalformedPayload("missing 'id'".to_string()))?
            .to_string();

        let kind = payload
            .get("type")
            .and_then(Value::as_str)
            .ok_or_else(|| WebhookError::MalformedPayload("missing 'type'".to_string()))?
            .to_string();

        let livemode = payload
            .get("livemode")
            .and_then(Value::as_bool)
            .ok_or_else(|| WebhookError::MalformedPayload("missing 'livemode'".to_string()))?;

        let data = payload.get("data").cloned().unwrap_or(Value::Null);

        Ok(Self {
            id,
            kind,
            livemode,
            data,
            payload,
        })
    }

    /// The parsed event kind.
    pub fn parsed_kind(&self) -> EventKind {
        EventKind::parse(&self.kind)
    }

    /// The affected object inside `data`, if present.
    pub fn object(&self) -> Option<&Value> {
        self.data.get("object")
    }

    /// The processor customer id referenced by the affected object.
    ///
    /// Subscription and invoice objects carry it in their `customer` field.
    pub fn customer_id(&self) -> Option<&str> {
        self.object()?.get("customer")?.as_str()
    }
}
