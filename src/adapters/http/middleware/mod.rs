//! HTTP middleware and extractors.

pub mod auth;

pub use auth::{decode_token, issue_token, AuthenticatedUser, Claims};
