//! Axum router configuration for donation endpoints.

use axum::routing::{get, post};
use axum::Router;

use super::super::AppState;
use super::handlers::{donate_monthly, donate_one_time, thanks};

/// Create the donation router, mounted under `/donate`.
///
/// Donations are anonymous; no authentication capability is attached.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/onetime/", post(donate_one_time))
        .route("/monthly/", post(donate_monthly))
        .route("/thanks/", get(thanks))
}
