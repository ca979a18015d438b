//! ChangeCardHandler - Command handler for replacing the stored card.

use futures::future::try_join_all;
use std::sync::Arc;

use crate::domain::billing::{BillingError, Customer};
use crate::domain::foundation::UserId;
use crate::ports::{CustomerRepository, GatewayInvoice, PaymentGateway};

use super::get_or_create_customer;

/// Command to replace the customer's card token.
#[derive(Debug, Clone)]
pub struct ChangeCardCommand {
    pub user_id: UserId,
    pub email: String,

    /// Card token from the payment form.
    pub card_token: String,
}

/// Result of a successful card update.
#[derive(Debug, Clone)]
pub struct ChangeCardResult {
    pub customer: Customer,

    /// True when this was the first card on file and an invoice was sent.
    pub invoice_sent: bool,

    /// Unpaid invoices that were retried after the update.
    pub retried_invoices: usize,
}

/// Handler for the change-card form.
///
/// When no card fingerprint existed before the update, an invoice is sent
/// immediately; previously unpaid invoices are retried in every case.
pub struct ChangeCardHandler {
    customers: Arc<dyn CustomerRepository>,
    gateway: Arc<dyn PaymentGateway>,
}

impl ChangeCardHandler {
    pub fn new(customers: Arc<dyn CustomerRepository>, gateway: Arc<dyn PaymentGateway>) -> Self {
        Self { customers, gateway }
    }

    pub async fn handle(&self, cmd: ChangeCardCommand) -> Result<ChangeCardResult, BillingError> {
        // 1. Fetch (or lazily create) the billing customer
        let mut customer =
            get_or_create_customer(&self.customers, &self.gateway, &cmd.user_id, &cmd.email)
                .await?;

        // First-card detection must happen before the update overwrites the
        // fingerprint.
        let send_invoice = !customer.has_card();

        // 2. Replace the card at the processor
        let card = self
            .gateway
            .update_card(&customer.stripe_id, &cmd.card_token)
            .await?;
        customer.set_card(card.fingerprint, card.last_4, card.brand);
        self.customers.update(&customer).await?;

        // 3. First card on file: invoice immediately
        if send_invoice {
            let invoice = self
                .gateway
                .create_invoice(&customer.stripe_id, "Outstanding balance")
                .await?;
            self.gateway.pay_invoice(&invoice.id).await?;
        }

        // 4. Retry anything that previously failed to collect
        let retried_invoices = self.retry_unpaid_invoices(&customer).await?;

        tracing::info!(
            user_id = %cmd.user_id,
            invoice_sent = send_invoice,
            retried_invoices,
            "Card updated"
        );

        Ok(ChangeCardResult {
            customer,
            invoice_sent: send_invoice,
            retried_invoices,
        })
    }

    /// Re-attempts payment of every unpaid, previously attempted invoice.
    async fn retry_unpaid_invoices(&self, customer: &Customer) -> Result<usize, BillingError> {
        let invoices = self.gateway.list_invoices(&customer.stripe_id).await?;
        let unpaid: Vec<&GatewayInvoice> = invoices
            .iter()
            .filter(|i| !i.paid && i.attempted)
            .collect();

        try_join_all(unpaid.iter().map(|i| self.gateway.pay_invoice(&i.id))).await?;

        Ok(unpaid.len())
    }
}
