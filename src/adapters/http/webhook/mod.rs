//! Webhook HTTP endpoint.
//!
//! Mounted at the configurable webhook path by the top-level router; no
//! authentication capability is attached (deliveries are verified by
//! signature and by re-fetching events from the processor).

mod handlers;

pub use handlers::receive_webhook;
