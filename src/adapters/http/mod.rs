//! HTTP adapter: axum routers, handlers, and DTOs.

pub mod billing;
pub mod directory;
pub mod donation;
mod error;
pub mod middleware;
pub mod webhook;

pub use error::{ApiError, ErrorResponse};

use axum::response::Redirect;
use axum::routing::{get, post};
use axum::Router;
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use crate::application::handlers::billing::{
    CancelSubscriptionHandler, ChangeCardHandler, ChangePlanHandler, GetAccountHandler,
    GetHistoryHandler, SubscribeHandler, SyncAccountHandler,
};
use crate::application::handlers::donation::{DonateMonthlyHandler, DonateOneTimeHandler};
use crate::application::handlers::webhook::{
    InvoiceEventHandler, KindRegistry, SubscriptionEventHandler,
};
use crate::adapters::stripe::SignatureVerifier;
use crate::config::AuthConfig;
use crate::domain::billing::PlanCatalog;
use crate::domain::webhook::WebhookProcessor;
use crate::ports::{CustomerRepository, EventRepository, PaymentGateway, UserDirectory};

/// Shared application state containing all dependencies.
///
/// Cloned per request; dependencies are Arc-wrapped for cheap sharing.
#[derive(Clone)]
pub struct AppState {
    pub customers: Arc<dyn CustomerRepository>,
    pub events: Arc<dyn EventRepository>,
    pub gateway: Arc<dyn PaymentGateway>,
    pub directory: Arc<dyn UserDirectory>,
    pub catalog: Arc<PlanCatalog>,
    pub auth: Arc<AuthConfig>,

    /// Verifier for webhook signatures; absent when no signing secret is
    /// configured.
    pub webhook_verifier: Option<Arc<SignatureVerifier>>,

    /// Path the webhook endpoint is mounted at.
    pub webhook_path: String,

    /// Catalog code of the recurring donation plan.
    pub donation_plan: String,
}

impl AppState {
    /// Create handlers on demand from the shared state.
    pub fn subscribe_handler(&self) -> SubscribeHandler {
        SubscribeHandler::new(
            self.customers.clone(),
            self.gateway.clone(),
            self.catalog.clone(),
        )
    }

    pub fn change_plan_handler(&self) -> ChangePlanHandler {
        ChangePlanHandler::new(
            self.customers.clone(),
            self.gateway.clone(),
            self.catalog.clone(),
        )
    }

    pub fn change_card_handler(&self) -> ChangeCardHandler {
        ChangeCardHandler::new(self.customers.clone(), self.gateway.clone())
    }

    pub fn cancel_subscription_handler(&self) -> CancelSubscriptionHandler {
        CancelSubscriptionHandler::new(
            self.customers.clone(),
            self.gateway.clone(),
            self.catalog.clone(),
        )
    }

    pub fn get_account_handler(&self) -> GetAccountHandler {
        GetAccountHandler::new(
            self.customers.clone(),
            self.gateway.clone(),
            self.catalog.clone(),
        )
    }

    pub fn get_history_handler(&self) -> GetHistoryHandler {
        GetHistoryHandler::new(self.customers.clone(), self.gateway.clone())
    }

    pub fn sync_account_handler(&self) -> SyncAccountHandler {
        SyncAccountHandler::new(
            self.customers.clone(),
            self.gateway.clone(),
            self.catalog.clone(),
        )
    }

    pub fn donate_one_time_handler(&self) -> DonateOneTimeHandler {
        DonateOneTimeHandler::new(self.gateway.clone())
    }

    pub fn donate_monthly_handler(&self) -> DonateMonthlyHandler {
        DonateMonthlyHandler::new(
            self.gateway.clone(),
            self.catalog.clone(),
            self.donation_plan.clone(),
        )
    }

    /// The webhook processor wired with all registered event handlers.
    pub fn webhook_processor(&self) -> WebhookProcessor {
        let registry = KindRegistry::new()
            .register(Arc::new(SubscriptionEventHandler::new(
                self.customers.clone(),
                self.catalog.clone(),
            )))
            .register(Arc::new(InvoiceEventHandler::new(
                self.customers.clone(),
                self.gateway.clone(),
                self.catalog.clone(),
            )));

        WebhookProcessor::new(
            self.events.clone(),
            self.gateway.clone(),
            Arc::new(registry),
        )
    }
}

/// Builds the application router.
///
/// # Routes
///
/// - `GET /` - redirect to the one-time donation page
/// - `/donate/...` - donation forms (anonymous)
/// - `/account/`, `/subscribe/`, `/change/...`, `/cancel/subscription/`,
///   `/history/`, `/a/sync/history/` - subscription lifecycle (auth required)
/// - `GET /a/check/available/:attr_name/` - availability web service
/// - `POST <webhook_path>` - processor webhook (signature verified when
///   configured, always acknowledges with 200)
pub fn build_router(state: AppState) -> Router {
    let webhook_path = state.webhook_path.clone();

    Router::new()
        .route("/", get(|| async { Redirect::to("/donate/onetime/") }))
        .merge(billing::routes())
        .nest("/donate", donation::routes())
        .merge(directory::routes())
        .route(&webhook_path, post(webhook::receive_webhook))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
