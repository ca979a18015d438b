//! Stripe adapter: HTTP gateway, API types, signature verification, and the
//! in-memory mock gateway.

mod api_types;
mod gateway;
mod mock_gateway;
mod signature;

pub use gateway::StripeGateway;
pub use mock_gateway::{active_subscription, test_card, unpaid_invoice, MockPaymentGateway};
pub use signature::{hex_encode, SignatureHeader, SignatureParseError, SignatureVerifier};
