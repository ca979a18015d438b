//! ChangePlanHandler - Command handler for switching plans.

use std::sync::Arc;

use crate::domain::billing::{BillingError, CurrentSubscription, PlanCatalog};
use crate::domain::foundation::UserId;
use crate::ports::{CreateSubscriptionRequest, CustomerRepository, PaymentGateway};

use super::subscription_from_gateway;

/// Command to move an existing subscriber onto a different plan.
#[derive(Debug, Clone)]
pub struct ChangePlanCommand {
    pub user_id: UserId,

    /// Catalog plan code from the form.
    pub plan: String,
}

/// Result of a successful plan change.
#[derive(Debug, Clone)]
pub struct ChangePlanResult {
    pub subscription: CurrentSubscription,
}

/// Handler for the change-plan form.
///
/// Requires an existing customer with a card on file. Error policy matches
/// [`super::SubscribeHandler`]: processor failures surface as form-level
/// errors.
pub struct ChangePlanHandler {
    customers: Arc<dyn CustomerRepository>,
    gateway: Arc<dyn PaymentGateway>,
    catalog: Arc<PlanCatalog>,
}

impl ChangePlanHandler {
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

    pub async fn handle(&self, cmd: ChangePlanCommand) -> Result<ChangePlanResult, BillingError> {
        // 1. Validate the plan selection
        let plan = self
            .catalog
            .find(&cmd.plan)
            .ok_or_else(|| BillingError::UnknownPlan(cmd.plan.clone()))?;

        // 2. Plan changes need an established customer with a card
        let customer = self
            .customers
            .find_by_user_id(&cmd.user_id)
            .await?
            .ok_or_else(|| BillingError::CustomerNotFound(cmd.user_id.to_string()))?;

        if !customer.has_card() {
            return Err(BillingError::NoCardOnFile);
        }

        // 3. Re-subscribe at the processor; it replaces the current plan
        let gateway_subscription = self
            .gateway
            .create_subscription(CreateSubscriptionRequest {
                customer_id: customer.stripe_id.clone(),
                plan_id: plan.stripe_plan_id.clone(),
                quantity: 1,
            })
            .await?;

        let subscription = subscription_from_gateway(&gateway_subscription, &self.catalog);
        self.customers
            .put_subscription(&customer.id, &subscription)
            .await?;

        tracing::info!(user_id = %cmd.user_id, plan = %plan.code, "Plan changed");

        Ok(ChangePlanResult { subscription })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::handlers::billing::testing::{
        customer_with_card, linked_customer, test_user_id, MockCustomerRepository, MockGateway,
    };

    fn command(plan: &str) -> ChangePlanCommand {
        ChangePlanCommand {
            user_id: test_user_id(),
            plan: plan.to_string(),
        }
    }

    fn handler(
        repo: Arc<MockCustomerRepository>,
        gateway: Arc<MockGateway>,
    ) -> ChangePlanHandler {
        ChangePlanHandler::new(repo, gateway, Arc::new(PlanCatalog::standard()))
    }

    #[tokio::test]
    async fn changes_plan_for_established_customer() {
        let repo = Arc::new(MockCustomerRepository::with_customer(customer_with_card()));
        let gateway = Arc::new(MockGateway::new());

        let result = handler(repo, gateway.clone())
            .handle(command("supporter-annual"))
            .await
            .unwrap();

        assert_eq!(result.subscription.plan, "supporter-annual");
        let sent = gateway.created_subscriptions.lock().unwrap();
        assert_eq!(sent[0].plan_id, "plan_supporter_annual");
    }

    #[tokio::test]
    async fn rejects_unknown_plan() {
        let repo = Arc::new(MockCustomerRepository::with_customer(customer_with_card()));
        let gateway = Arc::new(MockGateway::new());

        let result = handler(repo, gateway).handle(command("gold-plated")).await;

        assert!(matches!(result, Err(BillingError::UnknownPlan(_))));
    }

    #[tokio::test]
    async fn rejects_user_without_customer() {
        let repo = Arc::new(MockCustomerRepository::new());
        let gateway = Arc::new(MockGateway::new());

        let result = handler(repo, gateway)
            .handle(command("supporter-monthly"))
            .await;

        assert!(matches!(result, Err(BillingError::CustomerNotFound(_))));
    }

    #[tokio::test]
    async fn rejects_customer_without_card() {
        let repo = Arc::new(MockCustomerRepository::with_customer(linked_customer()));
        let gateway = Arc::new(MockGateway::new());

        let result = handler(repo, gateway)
            .handle(command("supporter-monthly"))
            .await;

        assert!(matches!(result, Err(BillingError::NoCardOnFile)));
    }

    #[tokio::test]
    async fn surfaces_processor_failure_like_subscribe_does() {
        // Unified error policy: change-plan catches and surfaces, it never
        // re-raises past the handler boundary.
        let repo = Arc::new(MockCustomerRepository::with_customer(customer_with_card()));
        let gateway = Arc::new(MockGateway::with_subscription_error("No such plan"));

        let result = handler(repo, gateway)
            .handle(command("supporter-monthly"))
            .await;

        match result {
            Err(err @ BillingError::Processor { .. }) => assert!(err.is_form_error()),
            other => panic!("unexpected result: {:?}", other),
        }
    }
}
