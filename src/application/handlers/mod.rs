//! Command and query handlers.
//!
//! Each handler owns its dependencies as `Arc<dyn Port>` and exposes a
//! single `handle` method taking a command/query struct.

pub mod billing;
pub mod donation;
pub mod webhook;
