//! Webhook domain: processor event envelopes and idempotent processing.

mod errors;
mod event;
mod processor;

pub use errors::WebhookError;
pub use event::{EventKind, IncomingEvent};
pub use processor::{
    EventDispatcher, EventHandler, WebhookOutcome, WebhookProcessor, DUPLICATE_MESSAGE,
};
