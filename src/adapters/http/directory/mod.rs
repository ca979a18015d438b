//! Directory HTTP endpoints (availability web service).

pub mod handlers;
mod routes;

pub use routes::routes;
