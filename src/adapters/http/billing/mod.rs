//! Billing HTTP endpoints: account, subscription lifecycle, history.

pub mod dto;
pub mod handlers;
mod routes;

pub use routes::routes;
