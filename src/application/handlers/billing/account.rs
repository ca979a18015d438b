//! Account queries: the account view, payment history, and re-sync.

use std::sync::Arc;

use crate::domain::billing::{BillingError, CurrentSubscription, Customer, Plan, PlanCatalog};
use crate::domain::foundation::UserId;
use crate::ports::{CustomerRepository, GatewayInvoice, PaymentGateway};

use super::{get_or_create_customer, subscription_from_gateway};

/// Query for the account page.
#[derive(Debug, Clone)]
pub struct AccountQuery {
    pub user_id: UserId,
    pub email: String,
}

/// The account page contents.
#[derive(Debug, Clone)]
pub struct AccountView {
    pub customer: Customer,
    pub subscription: Option<CurrentSubscription>,
    pub plans: Vec<Plan>,
}

/// Handler for the account view.
///
/// Viewing the account lazily establishes the billing customer, mirroring
/// the first-payment-action semantics of the other views.
pub struct GetAccountHandler {
    customers: Arc<dyn CustomerRepository>,
    gateway: Arc<dyn PaymentGateway>,
    catalog: Arc<PlanCatalog>,
}

impl GetAccountHandler {
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

    pub async fn handle(&self, query: AccountQuery) -> Result<AccountView, BillingError> {
        let customer =
            get_or_create_customer(&self.customers, &self.gateway, &query.user_id, &query.email)
                .await?;

        let subscription = self.customers.subscription_for(&customer.id).await?;

        Ok(AccountView {
            customer,
            subscription,
            plans: self.catalog.plans().to_vec(),
        })
    }
}

/// Query for the payment history page.
#[derive(Debug, Clone)]
pub struct HistoryQuery {
    pub user_id: UserId,
}

/// Handler for the history view.
///
/// Invoices are fetched live from the processor; nothing is mirrored.
pub struct GetHistoryHandler {
    customers: Arc<dyn CustomerRepository>,
    gateway: Arc<dyn PaymentGateway>,
}

impl GetHistoryHandler {
    pub fn new(customers: Arc<dyn CustomerRepository>, gateway: Arc<dyn PaymentGateway>) -> Self {
        Self { customers, gateway }
    }

    pub async fn handle(&self, query: HistoryQuery) -> Result<Vec<GatewayInvoice>, BillingError> {
        let customer = self
            .customers
            .find_by_user_id(&query.user_id)
            .await?
            .ok_or_else(|| BillingError::CustomerNotFound(query.user_id.to_string()))?;

        Ok(self.gateway.list_invoices(&customer.stripe_id).await?)
    }
}

/// Command to re-sync local billing state from the processor.
#[derive(Debug, Clone)]
pub struct SyncAccountCommand {
    pub user_id: UserId,
}

/// Result of a re-sync.
#[derive(Debug, Clone)]
pub struct SyncAccountResult {
    pub customer: Customer,
    pub subscription: Option<CurrentSubscription>,
}

/// Handler for the sync-history web service.
///
/// Re-fetches the processor customer and overwrites the local card fields
/// and subscription with whatever the processor reports.
pub struct SyncAccountHandler {
    customers: Arc<dyn CustomerRepository>,
    gateway: Arc<dyn PaymentGateway>,
    catalog: Arc<PlanCatalog>,
}

impl SyncAccountHandler {
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

    pub async fn handle(&self, cmd: SyncAccountCommand) -> Result<SyncAccountResult, BillingError> {
        let mut customer = self
            .customers
            .find_by_user_id(&cmd.user_id)
            .await?
            .ok_or_else(|| BillingError::CustomerNotFound(cmd.user_id.to_string()))?;

        let remote = self
            .gateway
            .retrieve_customer(&customer.stripe_id)
            .await?
            .ok_or_else(|| {
                BillingError::processor(format!(
                    "Customer {} no longer exists at the processor",
                    customer.stripe_id
                ))
            })?;

        match remote.active_card {
            Some(card) => customer.set_card(card.fingerprint, card.last_4, card.brand),
            None => customer.clear_card(),
        }
        self.customers.update(&customer).await?;

        let subscription = match remote.subscription {
            Some(gateway_subscription) => {
                let subscription = subscription_from_gateway(&gateway_subscription, &self.catalog);
                self.customers
                    .put_subscription(&customer.id, &subscription)
                    .await?;
                Some(subscription)
            }
            None => self.customers.subscription_for(&customer.id).await?,
        };

        tracing::debug!(user_id = %cmd.user_id, "Billing state re-synced");

        Ok(SyncAccountResult {
            customer,
            subscription,
        })
    }
}
