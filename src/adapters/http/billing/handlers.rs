//! HTTP handlers for billing endpoints.

use axum::extract::State;
use axum::response::IntoResponse;
use axum::Json;

use crate::application::handlers::billing::{
    AccountQuery, CancelSubscriptionCommand, ChangeCardCommand, ChangePlanCommand, HistoryQuery,
    SubscribeCommand, SyncAccountCommand,
};

use super::super::error::ApiError;
use super::super::middleware::AuthenticatedUser;
use super::super::AppState;
use super::dto::{
    AccountResponse, CancelResponse, CardUpdatedResponse, ChangeCardRequest, ChangePlanRequest,
    CustomerResponse, HistoryResponse, InvoiceResponse, SubscribeRequest,
    SubscriptionChangedResponse, SubscriptionResponse,
};

/// GET /account/ - customer, subscription, and offered plans.
pub async fn get_account(
    State(state): State<AppState>,
    user: AuthenticatedUser,
) -> Result<impl IntoResponse, ApiError> {
    let view = state
        .get_account_handler()
        .handle(AccountQuery {
            user_id: user.user_id,
            email: user.email,
        })
        .await?;

    Ok(Json(AccountResponse::from(view)))
}

/// POST /subscribe/ - attach a card and start a subscription.
pub async fn subscribe(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Json(request): Json<SubscribeRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let result = state
        .subscribe_handler()
        .handle(SubscribeCommand {
            user_id: user.user_id,
            email: user.email,
            plan: request.plan,
            card_token: request.stripe_token,
        })
        .await?;

    Ok(Json(SubscriptionChangedResponse {
        message: "You are now subscribed!".to_string(),
        subscription: SubscriptionResponse::from(result.subscription),
    }))
}

/// POST /change/plan/ - switch an existing subscriber to another plan.
pub async fn change_plan(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Json(request): Json<ChangePlanRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let result = state
        .change_plan_handler()
        .handle(ChangePlanCommand {
            user_id: user.user_id,
            plan: request.plan,
        })
        .await?;

    Ok(Json(SubscriptionChangedResponse {
        message: "You've just changed your plan!".to_string(),
        subscription: SubscriptionResponse::from(result.subscription),
    }))
}

/// POST /change/card/ - replace the stored card.
pub async fn change_card(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Json(request): Json<ChangeCardRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let result = state
        .change_card_handler()
        .handle(ChangeCardCommand {
            user_id: user.user_id,
            email: user.email,
            card_token: request.stripe_token,
        })
        .await?;

    Ok(Json(CardUpdatedResponse {
        message: "Your card is now updated.".to_string(),
        customer: CustomerResponse::from(result.customer),
        invoice_sent: result.invoice_sent,
        retried_invoices: result.retried_invoices,
    }))
}

/// POST /cancel/subscription/ - cancel at period end.
pub async fn cancel_subscription(
    State(state): State<AppState>,
    user: AuthenticatedUser,
) -> Result<impl IntoResponse, ApiError> {
    let result = state
        .cancel_subscription_handler()
        .handle(CancelSubscriptionCommand {
            user_id: user.user_id,
        })
        .await?;

    Ok(Json(CancelResponse::from(result)))
}

/// GET /history/ - invoices fetched live from the processor.
pub async fn get_history(
    State(state): State<AppState>,
    user: AuthenticatedUser,
) -> Result<impl IntoResponse, ApiError> {
    let invoices = state
        .get_history_handler()
        .handle(HistoryQuery {
            user_id: user.user_id,
        })
        .await?;

    Ok(Json(HistoryResponse {
        invoices: invoices.into_iter().map(InvoiceResponse::from).collect(),
    }))
}

/// POST /a/sync/history/ - re-sync local billing state from the processor.
pub async fn sync_history(
    State(state): State<AppState>,
    user: AuthenticatedUser,
) -> Result<impl IntoResponse, ApiError> {
    let result = state
        .sync_account_handler()
        .handle(SyncAccountCommand {
            user_id: user.user_id,
        })
        .await?;

    Ok(Json(AccountResponse {
        customer: CustomerResponse::from(result.customer),
        subscription: result.subscription.map(SubscriptionResponse::from),
        plans: Vec::new(),
    }))
}
