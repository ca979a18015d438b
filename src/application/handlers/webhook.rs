//! Webhook event handlers - apply processor events to local billing state.
//!
//! Each handler covers a family of event kinds and is registered in a
//! [`KindRegistry`], which the [`crate::domain::webhook::WebhookProcessor`]
//! uses to dispatch validated events.

use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;

use crate::domain::billing::{CurrentSubscription, PlanCatalog, SubscriptionStatus};
use crate::domain::foundation::Timestamp;
use crate::domain::webhook::{EventDispatcher, EventHandler, EventKind, IncomingEvent, WebhookError};
use crate::ports::{CustomerRepository, PaymentGateway};

use super::billing::subscription_from_gateway;

/// Builds a local subscription record from a processor subscription object
/// as embedded in webhook payloads.
///
/// Returns `None` when required fields are missing.
fn subscription_from_object(object: &Value, catalog: &PlanCatalog) -> Option<CurrentSubscription> {
    let plan_object = object.get("plan")?;
    let plan_id = plan_object.get("id")?.as_str()?;
    let status = SubscriptionStatus::parse(object.get("status")?.as_str()?);
    let period_start = object.get("current_period_start")?.as_i64()?;
    let period_end = object.get("current_period_end")?.as_i64()?;

    let plan = catalog
        .find_by_processor_id(plan_id)
        .map(|p| p.code.clone())
        .unwrap_or_else(|| plan_id.to_string());

    Some(CurrentSubscription {
        plan,
        quantity: object.get("quantity").and_then(Value::as_i64).unwrap_or(1),
        status,
        current_period_start: Timestamp::from_unix_secs(period_start),
        current_period_end: Timestamp::from_unix_secs(period_end),
        amount_cents: plan_object.get("amount").and_then(Value::as_i64).unwrap_or(0),
        currency: plan_object
            .get("currency")
            .and_then(Value::as_str)
            .unwrap_or("usd")
            .to_string(),
        cancel_at_period_end: object
            .get("cancel_at_period_end")
            .and_then(Value::as_bool)
            .unwrap_or(false),
        canceled_at: object
            .get("canceled_at")
            .and_then(Value::as_i64)
            .map(Timestamp::from_unix_secs),
        start: object
            .get("start")
            .and_then(Value::as_i64)
            .map(Timestamp::from_unix_secs)
            .unwrap_or_else(|| Timestamp::from_unix_secs(period_start)),
    })
}

/// Applies `customer.subscription.*` events to the local subscription.
pub struct SubscriptionEventHandler {
    customers: Arc<dyn CustomerRepository>,
    catalog: Arc<PlanCatalog>,
}

impl SubscriptionEventHandler {
    pub fn new(customers: Arc<dyn CustomerRepository>, catalog: Arc<PlanCatalog>) -> Self {
        Self { customers, catalog }
    }
}

#[async_trait]
impl EventHandler for SubscriptionEventHandler {
    fn handles(&self) -> Vec<EventKind> {
        vec![
            EventKind::SubscriptionCreated,
            EventKind::SubscriptionUpdated,
            EventKind::SubscriptionDeleted,
        ]
    }

    async fn handle(&self, event: &IncomingEvent) -> Result<(), WebhookError> {
        let stripe_id = event.customer_id().ok_or_else(|| {
            WebhookError::Handler("subscription event has no customer reference".to_string())
        })?;

        let customer = match self.customers.find_by_stripe_id(stripe_id).await? {
            Some(customer) => customer,
            None => {
                return Err(WebhookError::Ignored(format!(
                    "no local customer for {}",
                    stripe_id
                )))
            }
        };

        if event.parsed_kind() == EventKind::SubscriptionDeleted {
            match self.customers.subscription_for(&customer.id).await? {
                Some(mut subscription) => {
                    subscription.mark_cancelled(Timestamp::now());
                    self.customers
                        .put_subscription(&customer.id, &subscription)
                        .await?;
                    Ok(())
                }
                None => Err(WebhookError::Ignored(
                    "no local subscription to cancel".to_string(),
                )),
            }
        } else {
            let object = event.object().ok_or_else(|| {
                WebhookError::Handler("subscription event has no object".to_string())
            })?;
            let subscription = subscription_from_object(object, &self.catalog).ok_or_else(|| {
                WebhookError::Handler("subscription object is missing required fields".to_string())
            })?;
            self.customers
                .put_subscription(&customer.id, &subscription)
                .await?;
            Ok(())
        }
    }
}

/// Applies `invoice.*` events by re-syncing the customer's subscription
/// state from the processor.
pub struct InvoiceEventHandler {
    customers: Arc<dyn CustomerRepository>,
    gateway: Arc<dyn PaymentGateway>,
    catalog: Arc<PlanCatalog>,
}

impl InvoiceEventHandler {
    pub fn new(
        customers: Arc<dyn CustomerRepository>,
        gateway: Arc<dyn PaymentGateway>,
        catalog: Arc<PlanCatalog>,
    ) -> Self {
        Self {
            customers,
            gateway,
            catalog,
        }
    }
}

#[async_trait]
impl EventHandler for InvoiceEventHandler {
    fn handles(&self) -> Vec<EventKind> {
        vec![
            EventKind::InvoicePaymentSucceeded,
            EventKind::InvoicePaymentFailed,
            EventKind::InvoicePaid,
        ]
    }

    async fn handle(&self, event: &IncomingEvent) -> Result<(), WebhookError> {
        let stripe_id = event.customer_id().ok_or_else(|| {
            WebhookError::Handler("invoice event has no customer reference".to_string())
        })?;

        let customer = match self.customers.find_by_stripe_id(stripe_id).await? {
            Some(customer) => customer,
            None => {
                return Err(WebhookError::Ignored(format!(
                    "no local customer for {}",
                    stripe_id
                )))
            }
        };

        let remote = self
            .gateway
            .retrieve_customer(stripe_id)
            .await
            .map_err(|e| WebhookError::Handler(e.to_string()))?;

        match remote.and_then(|c| c.subscription) {
            Some(gateway_subscription) => {
                let subscription = subscription_from_gateway(&gateway_subscription, &self.catalog);
                self.customers
                    .put_subscription(&customer.id, &subscription)
                    .await?;
            }
            None => {
                tracing::debug!(customer_id = %stripe_id, "Invoice event with no subscription to sync");
            }
        }
        Ok(())
    }
}

/// Dispatcher routing events to the first handler declaring their kind.
#[derive(Default)]
pub struct KindRegistry {
    handlers: Vec<Arc<dyn EventHandler>>,
}

impl KindRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a handler for the kinds it declares.
    pub fn register(mut self, handler: Arc<dyn EventHandler>) -> Self {
        self.handlers.push(handler);
        self
    }
}

#[async_trait]
impl EventDispatcher for KindRegistry {
    fn handler_for(&self, kind: &EventKind) -> Option<&dyn EventHandler> {
        self.handlers
            .iter()
            .find(|h| h.handles().contains(kind))
            .map(|h| h.as_ref())
    }
}
