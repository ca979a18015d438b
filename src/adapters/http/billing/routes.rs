//! Axum router configuration for billing endpoints.

use axum::routing::{get, post};
use axum::Router;

use super::super::AppState;
use super::handlers::{
    cancel_subscription, change_card, change_plan, get_account, get_history, subscribe,
    sync_history,
};

/// Create the billing router.
///
/// All endpoints require authentication (via the `AuthenticatedUser`
/// extractor in each handler).
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/account/", get(get_account))
        .route("/subscribe/", post(subscribe))
        .route("/change/plan/", post(change_plan))
        .route("/change/card/", post(change_card))
        .route("/cancel/subscription/", post(cancel_subscription))
        .route("/history/", get(get_history))
        .route("/a/sync/history/", post(sync_history))
}
