//! In-memory payment gateway for tests and local development.
//!
//! Captures every mutating call so tests can assert on exactly what was sent
//! to the processor, and lets failure modes be injected per operation.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use crate::domain::billing::SubscriptionStatus;
use crate::ports::{
    CreateCustomerRequest, CreateInvoiceItemRequest, CreateSubscriptionRequest, GatewayCard,
    GatewayCustomer, GatewayError, GatewayEvent, GatewayInvoice, GatewaySubscription,
    PaymentGateway,
};

/// Configurable in-memory payment gateway.
pub struct MockPaymentGateway {
    /// Customers returned by `retrieve_customer`, keyed by processor id.
    pub customers: Mutex<HashMap<String, GatewayCustomer>>,

    /// Events returned by `retrieve_event`, keyed by event id.
    pub events: Mutex<HashMap<String, GatewayEvent>>,

    /// Invoices returned by `list_invoices`.
    pub invoices: Mutex<Vec<GatewayInvoice>>,

    /// Forced response for `update_card`; defaults to a Visa test card.
    pub card_response: Mutex<Result<GatewayCard, GatewayError>>,

    /// Forced error for `create_subscription`.
    pub subscription_error: Mutex<Option<GatewayError>>,

    /// Status returned by `cancel_subscription`.
    pub cancel_status: Mutex<SubscriptionStatus>,

    // Captured calls
    pub created_customers: Mutex<Vec<CreateCustomerRequest>>,
    pub created_subscriptions: Mutex<Vec<CreateSubscriptionRequest>>,
    pub created_invoice_items: Mutex<Vec<CreateInvoiceItemRequest>>,
    pub invoice_creates: AtomicUsize,
    pub paid_invoices: Mutex<Vec<String>>,
}

impl Default for MockPaymentGateway {
    fn default() -> Self {
        Self {
            customers: Mutex::new(HashMap::new()),
            events: Mutex::new(HashMap::new()),
            invoices: Mutex::new(Vec::new()),
            card_response: Mutex::new(Ok(test_card())),
            subscription_error: Mutex::new(None),
            cancel_status: Mutex::new(SubscriptionStatus::Active),
            created_customers: Mutex::new(Vec::new()),
            created_subscriptions: Mutex::new(Vec::new()),
            created_invoice_items: Mutex::new(Vec::new()),
            invoice_creates: AtomicUsize::new(0),
            paid_invoices: Mutex::new(Vec::new()),
        }
    }
}

impl MockPaymentGateway {
    pub fn new() -> Self {
        Self::default()
    }

    /// Gateway whose card updates fail with a decline.
    pub fn with_declined_card(message: &str) -> Self {
        let gateway = Self::new();
        *gateway.card_response.lock().unwrap() = Err(GatewayError::card_declined(message));
        gateway
    }

    /// Gateway whose subscription creations fail.
    pub fn with_subscription_error(message: &str) -> Self {
        let gateway = Self::new();
        *gateway.subscription_error.lock().unwrap() = Some(GatewayError::api(message));
        gateway
    }

    /// Registers an event so `retrieve_event` confirms it.
    pub fn confirm_event(&self, event: GatewayEvent) {
        self.events.lock().unwrap().insert(event.id.clone(), event);
    }

    pub fn invoice_create_count(&self) -> usize {
        self.invoice_creates.load(Ordering::SeqCst)
    }
}

/// The card every successful `update_card` returns.
pub fn test_card() -> GatewayCard {
    GatewayCard {
        fingerprint: "fp_test".to_string(),
        last_4: "4242".to_string(),
        brand: "Visa".to_string(),
    }
}

/// An active subscription on the given plan.
pub fn active_subscription(plan_id: &str, quantity: i64) -> GatewaySubscription {
    GatewaySubscription {
        id: "sub_test".to_string(),
        customer_id: "cus_test".to_string(),
        plan_id: plan_id.to_string(),
        quantity,
        status: SubscriptionStatus::Active,
        current_period_start: 1704067200,
        current_period_end: 1706745600,
        amount_cents: 2500,
        currency: "usd".to_string(),
        cancel_at_period_end: false,
        canceled_at: None,
        start: 1704067200,
    }
}

/// An unpaid, previously attempted invoice.
pub fn unpaid_invoice(id: &str) -> GatewayInvoice {
    GatewayInvoice {
        id: id.to_string(),
        customer_id: "cus_test".to_string(),
        amount_cents: 2500,
        currency: "usd".to_string(),
        paid: false,
        attempted: true,
        created: 1704067200,
    }
}

#[async_trait]
impl PaymentGateway for MockPaymentGateway {
    async fn create_customer(
        &self,
        request: CreateCustomerRequest,
    ) -> Result<GatewayCustomer, GatewayError> {
        let id = format!(
            "cus_test{}",
            self.created_customers.lock().unwrap().len() + 1
        );
        let subscription = request
            .plan
            .as_ref()
            .map(|plan| active_subscription(plan, request.quantity.unwrap_or(1)));
        let customer = GatewayCustomer {
            id,
            email: Some(request.email.clone()),
            active_card: request.card_token.as_ref().map(|_| test_card()),
            subscription,
            created: 1704067200,
        };
        self.created_customers.lock().unwrap().push(request);
        Ok(customer)
    }

    async fn retrieve_customer(
        &self,
        customer_id: &str,
    ) -> Result<Option<GatewayCustomer>, GatewayError> {
        Ok(self.customers.lock().unwrap().get(customer_id).cloned())
    }

    async fn update_card(
        &self,
        _customer_id: &str,
        _card_token: &str,
    ) -> Result<GatewayCard, GatewayError> {
        self.card_response.lock().unwrap().clone()
    }

    async fn create_subscription(
        &self,
        request: CreateSubscriptionRequest,
    ) -> Result<GatewaySubscription, GatewayError> {
        if let Some(err) = self.subscription_error.lock().unwrap().clone() {
            return Err(err);
        }
        let subscription = active_subscription(&request.plan_id, request.quantity);
        self.created_subscriptions.lock().unwrap().push(request);
        Ok(subscription)
    }

    async fn cancel_subscription(
        &self,
        customer_id: &str,
        at_period_end: bool,
    ) -> Result<GatewaySubscription, GatewayError> {
        let status = *self.cancel_status.lock().unwrap();
        let mut subscription = active_subscription("plan_supporter_monthly", 1);
        subscription.customer_id = customer_id.to_string();
        subscription.status = status;
        subscription.cancel_at_period_end = at_period_end && !status.is_terminal();
        subscription.canceled_at = Some(1704070800);
        Ok(subscription)
    }

    async fn create_invoice_item(
        &self,
        request: CreateInvoiceItemRequest,
    ) -> Result<String, GatewayError> {
        self.created_invoice_items.lock().unwrap().push(request);
        Ok("ii_test".to_string())
    }

    async fn create_invoice(
        &self,
        customer_id: &str,
        _description: &str,
    ) -> Result<GatewayInvoice, GatewayError> {
        let n = self.invoice_creates.fetch_add(1, Ordering::SeqCst);
        Ok(GatewayInvoice {
            id: format!("in_test{}", n + 1),
            customer_id: customer_id.to_string(),
            amount_cents: 2500,
            currency: "usd".to_string(),
            paid: false,
            attempted: false,
            created: 1704067200,
        })
    }

    async fn pay_invoice(&self, invoice_id: &str) -> Result<GatewayInvoice, GatewayError> {
        self.paid_invoices
            .lock()
            .unwrap()
            .push(invoice_id.to_string());
        let mut invoice = unpaid_invoice(invoice_id);
        invoice.paid = true;
        Ok(invoice)
    }

    async fn list_invoices(
        &self,
        _customer_id: &str,
    ) -> Result<Vec<GatewayInvoice>, GatewayError> {
        Ok(self.invoices.lock().unwrap().clone())
    }

    async fn retrieve_event(
        &self,
        event_id: &str,
    ) -> Result<Option<GatewayEvent>, GatewayError> {
        Ok(self.events.lock().unwrap().get(event_id).cloned())
    }
}
