//! Billing command/query handlers: subscription lifecycle and account views.

mod account;
mod cancel_subscription;
mod change_card;
mod change_plan;
mod subscribe;

#[cfg(test)]
pub(crate) mod testing;

pub use account::{
    AccountQuery, AccountView, GetAccountHandler, GetHistoryHandler, HistoryQuery, SyncAccountHandler,
    SyncAccountCommand, SyncAccountResult,
};
pub use cancel_subscription::{
    CancelOutcome, CancelSubscriptionCommand, CancelSubscriptionHandler, CancelSubscriptionResult,
};
pub use change_card::{ChangeCardCommand, ChangeCardHandler, ChangeCardResult};
pub use change_plan::{ChangePlanCommand, ChangePlanHandler, ChangePlanResult};
pub use subscribe::{SubscribeCommand, SubscribeHandler, SubscribeResult};

use std::sync::Arc;

use crate::domain::billing::{BillingError, CurrentSubscription, Customer, PlanCatalog};
use crate::domain::foundation::{Timestamp, UserId};
use crate::ports::{
    CreateCustomerRequest, CustomerRepository, GatewaySubscription, PaymentGateway,
};

/// Maps a processor subscription onto the local record, translating the
/// processor plan id back to a catalog code where possible.
pub(crate) fn subscription_from_gateway(
    subscription: &GatewaySubscription,
    catalog: &PlanCatalog,
) -> CurrentSubscription {
    let plan = catalog
        .find_by_processor_id(&subscription.plan_id)
        .map(|p| p.code.clone())
        .unwrap_or_else(|| subscription.plan_id.clone());

    CurrentSubscription {
        plan,
        quantity: subscription.quantity,
        status: subscription.status,
        current_period_start: Timestamp::from_unix_secs(subscription.current_period_start),
        current_period_end: Timestamp::from_unix_secs(subscription.current_period_end),
        amount_cents: subscription.amount_cents,
        currency: subscription.currency.clone(),
        cancel_at_period_end: subscription.cancel_at_period_end,
        canceled_at: subscription.canceled_at.map(Timestamp::from_unix_secs),
        start: Timestamp::from_unix_secs(subscription.start),
    }
}

/// Fetches the user's Customer, lazily creating the processor-side customer
/// and the local record on first access.
///
/// The uniqueness constraint behind `get_or_create` resolves concurrent
/// first access; when this call loses that race the just-created processor
/// customer is orphaned, which is logged for manual cleanup.
pub(crate) async fn get_or_create_customer(
    customers: &Arc<dyn CustomerRepository>,
    gateway: &Arc<dyn PaymentGateway>,
    user_id: &UserId,
    email: &str,
) -> Result<Customer, BillingError> {
    if let Some(existing) = customers.find_by_user_id(user_id).await? {
        return Ok(existing);
    }

    let created = gateway
        .create_customer(CreateCustomerRequest {
            email: email.to_string(),
            description: format!("Billing customer for user {}", user_id),
            ..Default::default()
        })
        .await?;

    let result = customers
        .get_or_create(Customer::link(user_id.clone(), &created.id))
        .await?;

    if !result.created {
        tracing::warn!(
            user_id = %user_id,
            orphaned_stripe_id = %created.id,
            "Lost customer creation race; processor customer is orphaned"
        );
    }

    Ok(result.customer)
}
