//! Request/response DTOs for billing endpoints.

use serde::{Deserialize, Serialize};

use crate::application::handlers::billing::{AccountView, CancelOutcome, CancelSubscriptionResult};
use crate::domain::billing::{CurrentSubscription, Customer, Plan};
use crate::ports::GatewayInvoice;

/// POST /subscribe/ body.
#[derive(Debug, Clone, Deserialize)]
pub struct SubscribeRequest {
    /// Catalog plan code.
    pub plan: String,

    /// Card token from the payment form.
    pub stripe_token: String,
}

/// POST /change/plan/ body.
#[derive(Debug, Clone, Deserialize)]
pub struct ChangePlanRequest {
    /// Catalog plan code.
    pub plan: String,
}

/// POST /change/card/ body.
#[derive(Debug, Clone, Deserialize)]
pub struct ChangeCardRequest {
    /// Card token from the payment form.
    pub stripe_token: String,
}

/// Customer details in responses.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CustomerResponse {
    pub stripe_id: String,
    pub has_card: bool,
    pub card_last_4: String,
    pub card_kind: String,
}

impl From<Customer> for CustomerResponse {
    fn from(customer: Customer) -> Self {
        Self {
            has_card: customer.has_card(),
            stripe_id: customer.stripe_id,
            card_last_4: customer.card_last_4,
            card_kind: customer.card_kind,
        }
    }
}

/// Subscription details in responses.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubscriptionResponse {
    pub plan: String,
    pub quantity: i64,
    pub status: String,
    pub current_period_start: i64,
    pub current_period_end: i64,
    pub amount_cents: i64,
    pub currency: String,
    pub cancel_at_period_end: bool,
}

impl From<CurrentSubscription> for SubscriptionResponse {
    fn from(subscription: CurrentSubscription) -> Self {
        Self {
            plan: subscription.plan,
            quantity: subscription.quantity,
            status: subscription.status.to_string(),
            current_period_start: subscription.current_period_start.as_unix_secs(),
            current_period_end: subscription.current_period_end.as_unix_secs(),
            amount_cents: subscription.amount_cents,
            currency: subscription.currency,
            cancel_at_period_end: subscription.cancel_at_period_end,
        }
    }
}

/// Plan details in responses.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlanResponse {
    pub code: String,
    pub name: String,
    pub amount_cents: i64,
    pub currency: String,
    pub interval: String,
}

impl From<Plan> for PlanResponse {
    fn from(plan: Plan) -> Self {
        Self {
            code: plan.code,
            name: plan.name,
            amount_cents: plan.amount_cents,
            currency: plan.currency,
            interval: match plan.interval {
                crate::domain::billing::BillingInterval::Month => "month".to_string(),
                crate::domain::billing::BillingInterval::Year => "year".to_string(),
            },
        }
    }
}

/// GET /account/ response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccountResponse {
    pub customer: CustomerResponse,
    pub subscription: Option<SubscriptionResponse>,
    pub plans: Vec<PlanResponse>,
}

impl From<AccountView> for AccountResponse {
    fn from(view: AccountView) -> Self {
        Self {
            customer: view.customer.into(),
            subscription: view.subscription.map(SubscriptionResponse::from),
            plans: view.plans.into_iter().map(PlanResponse::from).collect(),
        }
    }
}

/// Response for subscribe and change-plan.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubscriptionChangedResponse {
    pub message: String,
    pub subscription: SubscriptionResponse,
}

/// POST /change/card/ response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CardUpdatedResponse {
    pub message: String,
    pub customer: CustomerResponse,
    pub invoice_sent: bool,
    pub retried_invoices: usize,
}

/// POST /cancel/subscription/ response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CancelResponse {
    pub message: String,
    pub status: String,

    /// Set when the cancellation is pending until period end.
    pub current_period_end: Option<i64>,
}

impl From<CancelSubscriptionResult> for CancelResponse {
    fn from(result: CancelSubscriptionResult) -> Self {
        match result.outcome {
            CancelOutcome::Cancelled => Self {
                message: "Your account is now cancelled.".to_string(),
                status: result.subscription.status.to_string(),
                current_period_end: None,
            },
            CancelOutcome::PendingUntil { status, until } => Self {
                message: format!(
                    "Your account status is now '{}' until '{}'",
                    status,
                    until.as_datetime().format("%Y-%m-%d")
                ),
                status,
                current_period_end: Some(until.as_unix_secs()),
            },
        }
    }
}

/// Invoice details in the history view.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InvoiceResponse {
    pub id: String,
    pub amount_cents: i64,
    pub currency: String,
    pub paid: bool,
    pub created: i64,
}

impl From<GatewayInvoice> for InvoiceResponse {
    fn from(invoice: GatewayInvoice) -> Self {
        Self {
            id: invoice.id,
            amount_cents: invoice.amount_cents,
            currency: invoice.currency,
            paid: invoice.paid,
            created: invoice.created,
        }
    }
}

/// GET /history/ response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryResponse {
    pub invoices: Vec<InvoiceResponse>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::billing::SubscriptionStatus;
    use crate::domain::foundation::Timestamp;

    #[test]
    fn cancel_response_terminal_message() {
        let result = CancelSubscriptionResult {
            subscription: CurrentSubscription {
                plan: "supporter-monthly".to_string(),
                quantity: 1,
                status: SubscriptionStatus::Cancelled,
                current_period_start: Timestamp::from_unix_secs(1704067200),
                current_period_end: Timestamp::from_unix_secs(1706745600),
                amount_cents: 2500,
                currency: "usd".to_string(),
                cancel_at_period_end: false,
                canceled_at: Some(Timestamp::from_unix_secs(1704070800)),
                start: Timestamp::from_unix_secs(1704067200),
            },
            outcome: CancelOutcome::Cancelled,
        };

        let response = CancelResponse::from(result);
        assert_eq!(response.message, "Your account is now cancelled.");
        assert!(response.current_period_end.is_none());
    }

    #[test]
    fn cancel_response_pending_message_carries_date() {
        let until = Timestamp::from_unix_secs(1706745600);
        let result = CancelSubscriptionResult {
            subscription: CurrentSubscription {
                plan: "supporter-monthly".to_string(),
                quantity: 1,
                status: SubscriptionStatus::Active,
                current_period_start: Timestamp::from_unix_secs(1704067200),
                current_period_end: until,
                amount_cents: 2500,
                currency: "usd".to_string(),
                cancel_at_period_end: true,
                canceled_at: Some(Timestamp::from_unix_secs(1704070800)),
                start: Timestamp::from_unix_secs(1704067200),
            },
            outcome: CancelOutcome::PendingUntil {
                status: "active".to_string(),
                until,
            },
        };

        let response = CancelResponse::from(result);
        assert!(response.message.contains("'active'"));
        assert!(response.message.contains("2024-02-01"));
        assert_eq!(response.current_period_end, Some(1706745600));
    }
}
