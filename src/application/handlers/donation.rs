//! Donation command handlers.
//!
//! Donations pass straight through to the processor: a processor-side
//! customer is created per donation and nothing is persisted locally.

use std::sync::Arc;

use crate::domain::billing::{BillingError, PlanCatalog};
use crate::domain::donation::{MonthlyDonation, OneTimeDonation};
use crate::ports::{CreateCustomerRequest, CreateInvoiceItemRequest, PaymentGateway};

const ONE_TIME_DESCRIPTION: &str = "One-time donation";
const MONTHLY_DESCRIPTION: &str = "Monthly donation";

/// Receipt for a completed one-time donation.
#[derive(Debug, Clone)]
pub struct OneTimeReceipt {
    /// Processor customer created for this donation.
    pub customer_id: String,

    /// Invoice that was paid.
    pub invoice_id: String,

    pub amount_cents: i64,
}

/// Handler for the one-time donation form.
///
/// Creates a processor customer with the submitted card, invoices the
/// donated amount, and pays the invoice immediately.
pub struct DonateOneTimeHandler {
    gateway: Arc<dyn PaymentGateway>,
}

impl DonateOneTimeHandler {
    pub fn new(gateway: Arc<dyn PaymentGateway>) -> Self {
        Self { gateway }
    }

    pub async fn handle(&self, donation: OneTimeDonation) -> Result<OneTimeReceipt, BillingError> {
        let metadata = donation.donor.metadata();

        // 1. Processor-side customer holding the card
        let customer = self
            .gateway
            .create_customer(CreateCustomerRequest {
                email: donation.donor.email.clone(),
                description: ONE_TIME_DESCRIPTION.to_string(),
                card_token: Some(donation.card_token.clone()),
                plan: None,
                quantity: None,
                metadata: metadata.clone(),
            })
            .await?;

        // 2. Invoice the donated amount and collect immediately
        self.gateway
            .create_invoice_item(CreateInvoiceItemRequest {
                customer_id: customer.id.clone(),
                amount_cents: donation.amount_cents(),
                currency: "usd".to_string(),
                description: ONE_TIME_DESCRIPTION.to_string(),
                metadata,
            })
            .await?;

        let invoice = self
            .gateway
            .create_invoice(&customer.id, ONE_TIME_DESCRIPTION)
            .await?;
        self.gateway.pay_invoice(&invoice.id).await?;

        tracing::info!(
            customer_id = %customer.id,
            amount_cents = donation.amount_cents(),
            "One-time donation collected"
        );

        Ok(OneTimeReceipt {
            customer_id: customer.id,
            invoice_id: invoice.id,
            amount_cents: donation.amount_cents(),
        })
    }
}

/// Receipt for a started monthly donation.
#[derive(Debug, Clone)]
pub struct MonthlyReceipt {
    /// Processor customer created for this donor.
    pub customer_id: String,

    /// Units subscribed on the donation plan.
    pub quantity: i64,
}

/// Handler for the monthly donation form.
///
/// Creates a processor customer subscribed to the fixed donation plan with
/// quantity equal to the donated amount.
pub struct DonateMonthlyHandler {
    gateway: Arc<dyn PaymentGateway>,
    catalog: Arc<PlanCatalog>,
    donation_plan: String,
}

impl DonateMonthlyHandler {
    pub fn new(
        gateway: Arc<dyn PaymentGateway>,
        catalog: Arc<PlanCatalog>,
        donation_plan: impl Into<String>,
    ) -> Self {
        Self {
            gateway,
            catalog,
            donation_plan: donation_plan.into(),
        }
    }

    pub async fn handle(&self, donation: MonthlyDonation) -> Result<MonthlyReceipt, BillingError> {
        let plan = self
            .catalog
            .find(&self.donation_plan)
            .ok_or_else(|| BillingError::UnknownPlan(self.donation_plan.clone()))?;

        let customer = self
            .gateway
            .create_customer(CreateCustomerRequest {
                email: donation.donor.email.clone(),
                description: MONTHLY_DESCRIPTION.to_string(),
                card_token: Some(donation.card_token.clone()),
                plan: Some(plan.stripe_plan_id.clone()),
                quantity: Some(donation.quantity),
                metadata: donation.donor.metadata(),
            })
            .await?;

        tracing::info!(
            customer_id = %customer.id,
            quantity = donation.quantity,
            "Monthly donation started"
        );

        Ok(MonthlyReceipt {
            customer_id: customer.id,
            quantity: donation.quantity,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::handlers::billing::testing::MockGateway;
    use crate::domain::donation::DonorInfo;

    fn donor() -> DonorInfo {
        DonorInfo {
            first_name: "Ada".to_string(),
            last_name: "Lovelace".to_string(),
            full_name: "Ada Lovelace".to_string(),
            email: "ada@example.com".to_string(),
            designations: "general".to_string(),
            additional_infos: vec![],
            comment: String::new(),
        }
    }

    #[tokio::test]
    async fn one_time_donation_invoices_and_pays() {
        let gateway = Arc::new(MockGateway::new());
        let handler = DonateOneTimeHandler::new(gateway.clone());

        let donation = OneTimeDonation::new(donor(), 25, "tok_visa").unwrap();
        let receipt = handler.handle(donation).await.unwrap();

        assert_eq!(receipt.amount_cents, 2500);

        // Customer carries the card and metadata.
        let created = gateway.created_customers.lock().unwrap();
        assert_eq!(created.len(), 1);
        assert_eq!(created[0].card_token.as_deref(), Some("tok_visa"));
        assert!(created[0].plan.is_none());

        // One invoice item, one invoice, paid once.
        let items = gateway.created_invoice_items.lock().unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].amount_cents, 2500);
        assert_eq!(gateway.invoice_create_count(), 1);
        assert_eq!(
            *gateway.paid_invoices.lock().unwrap(),
            vec![receipt.invoice_id]
        );
    }

    #[tokio::test]
    async fn monthly_donation_subscribes_with_quantity() {
        let gateway = Arc::new(MockGateway::new());
        let handler = DonateMonthlyHandler::new(
            gateway.clone(),
            Arc::new(PlanCatalog::standard()),
            "donation-monthly",
        );

        let donation = MonthlyDonation::new(donor(), Some("15"), "tok_visa").unwrap();
        let receipt = handler.handle(donation).await.unwrap();

        assert_eq!(receipt.quantity, 15);

        let created = gateway.created_customers.lock().unwrap();
        assert_eq!(created[0].plan.as_deref(), Some("plan_donation_monthly"));
        assert_eq!(created[0].quantity, Some(15));
    }

    #[tokio::test]
    async fn malformed_amount_defaults_quantity_to_one() {
        let gateway = Arc::new(MockGateway::new());
        let handler = DonateMonthlyHandler::new(
            gateway.clone(),
            Arc::new(PlanCatalog::standard()),
            "donation-monthly",
        );

        let donation = MonthlyDonation::new(donor(), Some("lots!"), "tok_visa").unwrap();
        let receipt = handler.handle(donation).await.unwrap();

        assert_eq!(receipt.quantity, 1);
        assert_eq!(
            gateway.created_customers.lock().unwrap()[0].quantity,
            Some(1)
        );
    }

    #[tokio::test]
    async fn monthly_donation_requires_configured_plan() {
        let gateway = Arc::new(MockGateway::new());
        let handler = DonateMonthlyHandler::new(
            gateway,
            Arc::new(PlanCatalog::standard()),
            "no-such-plan",
        );

        let donation = MonthlyDonation::new(donor(), Some("5"), "tok_visa").unwrap();
        let result = handler.handle(donation).await;

        assert!(matches!(result, Err(BillingError::UnknownPlan(_))));
    }
}
