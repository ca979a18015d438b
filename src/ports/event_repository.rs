//! EventRepository port - append-only log of processor webhook events.
//!
//! Enables idempotent webhook handling: each processor event id is stored at
//! most once, and duplicate deliveries (plus any processing failures) are
//! recorded as exception entries for later reconciliation.
//!
//! ## Why Webhook Idempotency Matters
//!
//! The processor delivers with at-least-once semantics. The same event may
//! arrive again after network timeouts, slow responses, or lost
//! acknowledgements. The UNIQUE constraint on the event id is the arbiter
//! for concurrent duplicate deliveries.

use async_trait::async_trait;
use serde_json::Value;

use crate::domain::foundation::{DomainError, Timestamp};

/// Stored webhook event, one per distinct processor event id.
///
/// Immutable after creation except for the `valid` and `processed` flags.
#[derive(Debug, Clone)]
pub struct EventRecord {
    /// Processor event id (evt_...). UNIQUE in storage.
    pub stripe_id: String,

    /// Kind string (e.g. "invoice.paid").
    pub kind: String,

    /// Whether the event originated in live mode.
    pub livemode: bool,

    /// The full message body as received.
    pub payload: Value,

    /// Outcome of validation against the processor. `None` until validated.
    pub valid: Option<bool>,

    /// Whether the event's effect has been applied.
    pub processed: bool,

    pub created_at: Timestamp,
}

impl EventRecord {
    /// Creates a record for a newly received event, not yet validated.
    pub fn received(
        stripe_id: impl Into<String>,
        kind: impl Into<String>,
        livemode: bool,
        payload: Value,
    ) -> Self {
        Self {
            stripe_id: stripe_id.into(),
            kind: kind.into(),
            livemode,
            payload,
            valid: None,
            processed: false,
            created_at: Timestamp::now(),
        }
    }
}

/// Stored processing exception. Never mutated after creation.
#[derive(Debug, Clone)]
pub struct ExceptionRecord {
    /// The offending delivery body.
    pub payload: Value,

    /// Human-readable description.
    pub message: String,

    /// Optional trace detail for debugging.
    pub traceback: String,

    pub created_at: Timestamp,
}

impl ExceptionRecord {
    /// Creates an exception record with no trace detail.
    pub fn new(payload: Value, message: impl Into<String>) -> Self {
        Self {
            payload,
            message: message.into(),
            traceback: String::new(),
            created_at: Timestamp::now(),
        }
    }

    /// Attaches trace detail.
    pub fn with_traceback(mut self, traceback: impl Into<String>) -> Self {
        self.traceback = traceback.into();
        self
    }
}

/// Result of attempting to save an event record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveResult {
    /// Record was inserted (first time seeing this event).
    Inserted,
    /// Record already exists (duplicate event).
    AlreadyExists,
}

/// Port for the webhook event log.
///
/// Implementations must use a storage-level UNIQUE constraint on the event
/// id so concurrent duplicate inserts resolve deterministically.
#[async_trait]
pub trait EventRepository: Send + Sync {
    /// Find a previously recorded event by its processor id.
    async fn find_by_stripe_id(
        &self,
        stripe_id: &str,
    ) -> Result<Option<EventRecord>, DomainError>;

    /// Attempt to insert an event record.
    ///
    /// Uses `ON CONFLICT DO NOTHING` semantics: returns
    /// [`SaveResult::Inserted`] for the first delivery of an id and
    /// [`SaveResult::AlreadyExists`] for every later one.
    async fn save(&self, record: EventRecord) -> Result<SaveResult, DomainError>;

    /// Record the validation outcome for an event.
    async fn mark_valid(&self, stripe_id: &str, valid: bool) -> Result<(), DomainError>;

    /// Mark an event's effect as applied.
    async fn mark_processed(&self, stripe_id: &str) -> Result<(), DomainError>;

    /// Append a processing exception.
    async fn record_exception(&self, exception: ExceptionRecord) -> Result<(), DomainError>;
}
