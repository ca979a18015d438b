//! Webhook processor - idempotent recording and handling of processor events.
//!
//! ## Design
//!
//! The processor runs every delivery through the same pipeline:
//! 1. Duplicate guard - a delivery whose event id is already recorded only
//!    produces an exception entry ("Duplicate event record")
//! 2. Record - insert the Event row; the storage UNIQUE constraint arbitrates
//!    concurrent duplicate deliveries
//! 3. Validate - re-fetch the event by id from the processor and compare the
//!    data object; events the processor does not confirm are never applied
//! 4. Process - dispatch on event kind; failures become exception entries
//!
//! The caller (the webhook endpoint) acknowledges every delivery regardless
//! of the outcome, so the processor never retry-storms an event that is
//! already durably recorded.
//!
//! ## Race Condition Handling
//!
//! When duplicate deliveries arrive simultaneously, the first insert wins
//! (UNIQUE constraint on the event id); the losers observe
//! `SaveResult::AlreadyExists` and take the duplicate branch.

use async_trait::async_trait;
use std::sync::Arc;

use crate::domain::webhook::{EventKind, IncomingEvent, WebhookError};
use crate::ports::{EventRecord, EventRepository, ExceptionRecord, PaymentGateway, SaveResult};

/// Message recorded for duplicate deliveries.
pub const DUPLICATE_MESSAGE: &str = "Duplicate event record";

/// Handler for one or more webhook event kinds.
///
/// Implementations should be stateless and apply the event's effect (e.g.
/// refresh a customer's subscription state).
#[async_trait]
pub trait EventHandler: Send + Sync {
    /// The event kinds this handler processes.
    fn handles(&self) -> Vec<EventKind>;

    /// Applies the event's effect.
    ///
    /// Returns `Err(WebhookError::Ignored(_))` to acknowledge an event
    /// without acting on it; other errors are recorded as exceptions.
    async fn handle(&self, event: &IncomingEvent) -> Result<(), WebhookError>;
}

/// Routes events to the handler registered for their kind.
#[async_trait]
pub trait EventDispatcher: Send + Sync {
    /// Find a handler for the given event kind.
    fn handler_for(&self, kind: &EventKind) -> Option<&dyn EventHandler>;

    /// Dispatch an event to its handler.
    ///
    /// Kinds with no handler are acknowledged without effect.
    async fn dispatch(&self, event: &IncomingEvent) -> Result<(), WebhookError> {
        match self.handler_for(&event.parsed_kind()) {
            Some(handler) => handler.handle(event).await,
            None => {
                tracing::debug!(event_id = %event.id, kind = %event.kind, "No handler for event kind");
                Ok(())
            }
        }
    }
}

/// Outcome of a webhook delivery, for logging and tests. The HTTP response
/// is 200 in every case.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WebhookOutcome {
    /// Event recorded, validated, and its effect applied.
    Processed,
    /// The event id was already recorded; only an exception entry was added.
    Duplicate,
    /// The processor did not confirm the event; it was recorded but not
    /// applied.
    Invalid,
    /// Validation passed but applying the effect failed; recorded as an
    /// exception.
    Failed(String),
}

/// Processes webhook deliveries with idempotency guarantees.
pub struct WebhookProcessor {
    events: Arc<dyn EventRepository>,
    gateway: Arc<dyn PaymentGateway>,
    dispatcher: Arc<dyn EventDispatcher>,
}

impl WebhookProcessor {
    /// Creates a processor over the given event log, gateway, and dispatcher.
    pub fn new(
        events: Arc<dyn EventRepository>,
        gateway: Arc<dyn PaymentGateway>,
        dispatcher: Arc<dyn EventDispatcher>,
    ) -> Self {
        Self {
            events,
            gateway,
            dispatcher,
        }
    }

    /// Runs one delivery through the pipeline.
    ///
    /// Returns `Err` only for storage failures while recording; everything
    /// else is reflected in the [`WebhookOutcome`].
    pub async fn receive(&self, event: IncomingEvent) -> Result<WebhookOutcome, WebhookError> {
        // 1. Duplicate guard
        if self.events.find_by_stripe_id(&event.id).await?.is_some() {
            self.record_duplicate(&event).await?;
            return Ok(WebhookOutcome::Duplicate);
        }

        // 2. Record; the UNIQUE constraint decides concurrent duplicates
        let record = EventRecord::received(
            &event.id,
            &event.kind,
            event.livemode,
            event.payload.clone(),
        );
        if self.events.save(record).await? == SaveResult::AlreadyExists {
            self.record_duplicate(&event).await?;
            return Ok(WebhookOutcome::Duplicate);
        }

        // 3. Validate against the processor
        match self.validate(&event).await {
            Ok(true) => {
                self.events.mark_valid(&event.id, true).await?;
            }
            Ok(false) => {
                self.events.mark_valid(&event.id, false).await?;
                self.events
                    .record_exception(ExceptionRecord::new(
                        event.payload.clone(),
                        format!("Event {} failed validation", event.id),
                    ))
                    .await?;
                return Ok(WebhookOutcome::Invalid);
            }
            Err(err) => {
                // Validation could not complete; leave the valid flag unset.
                self.events
                    .record_exception(
                        ExceptionRecord::new(
                            event.payload.clone(),
                            format!("Could not validate event {}", event.id),
                        )
                        .with_traceback(err.to_string()),
                    )
                    .await?;
                return Ok(WebhookOutcome::Invalid);
            }
        }

        // 4. Process
        match self.dispatcher.dispatch(&event).await {
            Ok(()) => {
                self.events.mark_processed(&event.id).await?;
                Ok(WebhookOutcome::Processed)
            }
            Err(WebhookError::Ignored(reason)) => {
                tracing::debug!(event_id = %event.id, %reason, "Event acknowledged without effect");
                self.events.mark_processed(&event.id).await?;
                Ok(WebhookOutcome::Processed)
            }
            Err(err) => {
                self.events
                    .record_exception(
                        ExceptionRecord::new(
                            event.payload.clone(),
                            format!("Failed to process event {}", event.id),
                        )
                        .with_traceback(err.to_string()),
                    )
                    .await?;
                Ok(WebhookOutcome::Failed(err.to_string()))
            }
        }
    }

    /// Confirms the delivery against the processor's copy of the event.
    async fn validate(&self, event: &IncomingEvent) -> Result<bool, WebhookError> {
        let fetched = self
            .gateway
            .retrieve_event(&event.id)
            .await
            .map_err(|e| WebhookError::Validation(e.to_string()))?;

        match fetched {
            Some(confirmed) => Ok(confirmed.data == event.data),
            None => Ok(false),
        }
    }

    async fn record_duplicate(&self, event: &IncomingEvent) -> Result<(), WebhookError> {
        tracing::warn!(event_id = %event.id, "Duplicate webhook delivery");
        self.events
            .record_exception(ExceptionRecord::new(
                event.payload.clone(),
                DUPLICATE_MESSAGE,
            ))
            .await?;
        Ok(())
    }
}
