//! SubscribeHandler - Command handler for starting a subscription.

use std::sync::Arc;

use crate::domain::billing::{BillingError, CurrentSubscription, Customer, PlanCatalog};
use crate::domain::foundation::UserId;
use crate::ports::{CreateSubscriptionRequest, CustomerRepository, PaymentGateway};

use super::{get_or_create_customer, subscription_from_gateway};

/// Command to subscribe the user to a plan.
#[derive(Debug, Clone)]
pub struct SubscribeCommand {
    pub user_id: UserId,
    pub email: String,

    /// Catalog plan code from the form.
    pub plan: String,

    /// Card token from the payment form.
    pub card_token: String,
}

/// Result of a successful subscription.
#[derive(Debug, Clone)]
pub struct SubscribeResult {
    pub customer: Customer,
    pub subscription: CurrentSubscription,
}

/// Handler for the subscribe form.
///
/// Attaches the submitted card and creates the processor subscription; the
/// local records mirror whatever the processor committed. Processor errors
/// are surfaced as form-level errors, never re-raised.
pub struct SubscribeHandler {
    customers: Arc<dyn CustomerRepository>,
    gateway: Arc<dyn PaymentGateway>,
    catalog: Arc<PlanCatalog>,
}

impl SubscribeHandler {
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

    pub async fn handle(&self, cmd: SubscribeCommand) -> Result<SubscribeResult, BillingError> {
        // 1. Validate the plan selection
        let plan = self
            .catalog
            .find(&cmd.plan)
            .ok_or_else(|| BillingError::UnknownPlan(cmd.plan.clone()))?;

        // 2. Lazily create the billing customer
        let mut customer =
            get_or_create_customer(&self.customers, &self.gateway, &cmd.user_id, &cmd.email)
                .await?;

        // 3. Attach the card
        let card = self
            .gateway
            .update_card(&customer.stripe_id, &cmd.card_token)
            .await?;
        customer.set_card(card.fingerprint, card.last_4, card.brand);
        self.customers.update(&customer).await?;

        // 4. Create the subscription at the processor
        let gateway_subscription = self
            .gateway
            .create_subscription(CreateSubscriptionRequest {
                customer_id: customer.stripe_id.clone(),
                plan_id: plan.stripe_plan_id.clone(),
                quantity: 1,
            })
            .await?;

        // 5. Mirror it locally
        let subscription = subscription_from_gateway(&gateway_subscription, &self.catalog);
        self.customers
            .put_subscription(&customer.id, &subscription)
            .await?;

        tracing::info!(user_id = %cmd.user_id, plan = %plan.code, "Subscription created");

        Ok(SubscribeResult {
            customer,
            subscription,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::handlers::billing::testing::{
        linked_customer, test_user_id, MockCustomerRepository, MockGateway,
    };
    use crate::domain::billing::SubscriptionStatus;

    fn command(plan: &str) -> SubscribeCommand {
        SubscribeCommand {
            user_id: test_user_id(),
            email: "subscriber@example.com".to_string(),
            plan: plan.to_string(),
            card_token: "tok_visa".to_string(),
        }
    }

    fn handler(
        repo: Arc<MockCustomerRepository>,
        gateway: Arc<MockGateway>,
    ) -> SubscribeHandler {
        SubscribeHandler::new(repo, gateway, Arc::new(PlanCatalog::standard()))
    }

    #[tokio::test]
    async fn subscribes_new_user_end_to_end() {
        let repo = Arc::new(MockCustomerRepository::new());
        let gateway = Arc::new(MockGateway::new());

        let result = handler(repo.clone(), gateway.clone())
            .handle(command("supporter-monthly"))
            .await
            .unwrap();

        // Processor customer created, card attached, subscription mirrored.
        assert_eq!(gateway.created_customers.lock().unwrap().len(), 1);
        assert!(result.customer.has_card());
        assert_eq!(result.subscription.plan, "supporter-monthly");
        assert_eq!(result.subscription.status, SubscriptionStatus::Active);

        let stored = repo
            .subscription_for(&result.customer.id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored, result.subscription);
    }

    #[tokio::test]
    async fn reuses_existing_customer() {
        let repo = Arc::new(MockCustomerRepository::with_customer(linked_customer()));
        let gateway = Arc::new(MockGateway::new());

        let result = handler(repo, gateway.clone())
            .handle(command("supporter-monthly"))
            .await
            .unwrap();

        // No new processor customer was created.
        assert!(gateway.created_customers.lock().unwrap().is_empty());
        assert_eq!(result.customer.stripe_id, "cus_existing");
    }

    #[tokio::test]
    async fn rejects_unknown_plan_before_touching_processor() {
        let repo = Arc::new(MockCustomerRepository::new());
        let gateway = Arc::new(MockGateway::new());

        let result = handler(repo, gateway.clone())
            .handle(command("gold-plated"))
            .await;

        assert!(matches!(result, Err(BillingError::UnknownPlan(_))));
        assert!(gateway.created_customers.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn surfaces_card_decline_as_form_error() {
        let repo = Arc::new(MockCustomerRepository::with_customer(linked_customer()));
        let gateway = Arc::new(MockGateway::with_declined_card("Your card was declined."));

        let result = handler(repo, gateway)
            .handle(command("supporter-monthly"))
            .await;

        match result {
            Err(err @ BillingError::Processor { .. }) => {
                assert!(err.is_form_error());
                assert_eq!(err.to_string(), "Your card was declined.");
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[tokio::test]
    async fn surfaces_subscription_failure_without_storing_subscription() {
        let repo = Arc::new(MockCustomerRepository::with_customer(linked_customer()));
        let gateway = Arc::new(MockGateway::with_subscription_error("No such plan"));

        let result = handler(repo.clone(), gateway)
            .handle(command("supporter-monthly"))
            .await;

        assert!(matches!(result, Err(BillingError::Processor { .. })));

        let customer = repo
            .find_by_user_id(&test_user_id())
            .await
            .unwrap()
            .unwrap();
        assert!(repo
            .subscription_for(&customer.id)
            .await
            .unwrap()
            .is_none());
    }
}
