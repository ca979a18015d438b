//! Axum router configuration for the directory web service.

use axum::routing::get;
use axum::Router;

use super::super::AppState;
use super::handlers::check_available;

/// Create the directory router.
pub fn routes() -> Router<AppState> {
    Router::new().route("/a/check/available/:attr_name/", get(check_available))
}
