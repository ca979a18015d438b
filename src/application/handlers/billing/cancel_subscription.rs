//! CancelSubscriptionHandler - Command handler for at-period-end cancellation.

use std::sync::Arc;

use crate::domain::billing::{BillingError, CurrentSubscription, PlanCatalog};
use crate::domain::foundation::{Timestamp, UserId};
use crate::ports::{CustomerRepository, PaymentGateway};

use super::subscription_from_gateway;

/// Command to cancel the user's subscription at period end.
#[derive(Debug, Clone)]
pub struct CancelSubscriptionCommand {
    pub user_id: UserId,
}

/// How the cancellation landed, as reported by the processor.
#[derive(Debug, Clone, PartialEq)]
pub enum CancelOutcome {
    /// The subscription is fully cancelled (terminal).
    Cancelled,

    /// The subscription stays in `status` until `until`, then ends.
    PendingUntil {
        status: String,
        until: Timestamp,
    },
}

/// Result of a cancellation request.
#[derive(Debug, Clone)]
pub struct CancelSubscriptionResult {
    pub subscription: CurrentSubscription,
    pub outcome: CancelOutcome,
}

/// Handler for the cancel-subscription form.
///
/// Cancellation is requested at period end; the local record is updated with
/// whatever status the processor reports and is never deleted here. Only a
/// fully cancelled response is terminal.
pub struct CancelSubscriptionHandler {
    customers: Arc<dyn CustomerRepository>,
    gateway: Arc<dyn PaymentGateway>,
    catalog: Arc<PlanCatalog>,
}

impl CancelSubscriptionHandler {
    pub fn new(
        customers: Arc<dyn CustomerRepository>,
        gateway: Arc<dyn PaymentGateway>,
        catalog: Arc<PlanCatalog>,
    ) -> Self {
        Self {
            customers,
            gateway,
            catalog,
        }
    }

    pub async fn handle(
        &self,
        cmd: CancelSubscriptionCommand,
    ) -> Result<CancelSubscriptionResult, BillingError> {
        // 1. The user must have a billing record
        let customer = self
            .customers
            .find_by_user_id(&cmd.user_id)
            .await?
            .ok_or_else(|| BillingError::CustomerNotFound(cmd.user_id.to_string()))?;

        // 2. Request at-period-end cancellation
        let gateway_subscription = self
            .gateway
            .cancel_subscription(&customer.stripe_id, true)
            .await?;

        // 3. Mirror the reported state; non-terminal statuses keep the row
        let subscription = subscription_from_gateway(&gateway_subscription, &self.catalog);
        self.customers
            .put_subscription(&customer.id, &subscription)
            .await?;

        let outcome = if subscription.status.is_terminal() {
            CancelOutcome::Cancelled
        } else {
            CancelOutcome::PendingUntil {
                status: subscription.status.to_string(),
                until: subscription.current_period_end,
            }
        };

        tracing::info!(user_id = %cmd.user_id, ?outcome, "Subscription cancellation requested");

        Ok(CancelSubscriptionResult {
            subscription,
            outcome,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::handlers::billing::testing::{
        customer_with_card, test_user_id, MockCustomerRepository, MockGateway,
    };
    use crate::domain::billing::SubscriptionStatus;

    fn handler(
        repo: Arc<MockCustomerRepository>,
        gateway: Arc<MockGateway>,
    ) -> CancelSubscriptionHandler {
        CancelSubscriptionHandler::new(repo, gateway, Arc::new(PlanCatalog::standard()))
    }

    fn command() -> CancelSubscriptionCommand {
        CancelSubscriptionCommand {
            user_id: test_user_id(),
        }
    }

    #[tokio::test]
    async fn pending_cancellation_reports_status_and_date() {
        let repo = Arc::new(MockCustomerRepository::with_customer(customer_with_card()));
        let gateway = Arc::new(MockGateway::new()); // cancel_status defaults to Active

        let result = handler(repo.clone(), gateway).handle(command()).await.unwrap();

        match result.outcome {
            CancelOutcome::PendingUntil { status, until } => {
                assert_eq!(status, "active");
                assert_eq!(until, Timestamp::from_unix_secs(1706745600));
            }
            other => panic!("unexpected outcome: {:?}", other),
        }

        // Local state survives: still present, flagged for period-end end.
        let customer = repo
            .find_by_user_id(&test_user_id())
            .await
            .unwrap()
            .unwrap();
        let stored = repo
            .subscription_for(&customer.id)
            .await
            .unwrap()
            .unwrap();
        assert!(stored.cancel_at_period_end);
        assert_eq!(stored.status, SubscriptionStatus::Active);
    }

    #[tokio::test]
    async fn full_cancellation_is_terminal() {
        let repo = Arc::new(MockCustomerRepository::with_customer(customer_with_card()));
        let gateway = Arc::new(MockGateway::new());
        *gateway.cancel_status.lock().unwrap() = SubscriptionStatus::Cancelled;

        let result = handler(repo.clone(), gateway).handle(command()).await.unwrap();

        assert_eq!(result.outcome, CancelOutcome::Cancelled);
        assert!(result.subscription.status.is_terminal());

        // The record is updated, never deleted.
        let customer = repo
            .find_by_user_id(&test_user_id())
            .await
            .unwrap()
            .unwrap();
        assert!(repo
            .subscription_for(&customer.id)
            .await
            .unwrap()
            .is_some());
    }

    #[tokio::test]
    async fn fails_without_billing_record() {
        let repo = Arc::new(MockCustomerRepository::new());
        let gateway = Arc::new(MockGateway::new());

        let result = handler(repo, gateway).handle(command()).await;

        assert!(matches!(result, Err(BillingError::CustomerNotFound(_))));
    }
}
