//! Plan catalog - the recurring billing configurations offered to subscribers.
//!
//! The catalog is constructed once at startup and passed into the application
//! explicitly; handlers validate submitted plan codes against it before
//! calling the processor.

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

/// Billing interval of a plan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BillingInterval {
    Month,
    Year,
}

/// A named recurring billing configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Plan {
    /// Catalog code submitted by forms (e.g. "supporter-monthly").
    pub code: String,

    /// Human-readable name.
    pub name: String,

    /// Processor-side plan/price identifier.
    pub stripe_plan_id: String,

    /// Per-interval amount in cents.
    pub amount_cents: i64,

    /// ISO currency code, lowercase.
    pub currency: String,

    pub interval: BillingInterval,
}

/// The plans offered by default.
static STANDARD_PLANS: Lazy<Vec<Plan>> = Lazy::new(|| {
    vec![
        Plan {
            code: "supporter-monthly".to_string(),
            name: "Supporter (monthly)".to_string(),
            stripe_plan_id: "plan_supporter_monthly".to_string(),
            amount_cents: 2500,
            currency: "usd".to_string(),
            interval: BillingInterval::Month,
        },
        Plan {
            code: "supporter-annual".to_string(),
            name: "Supporter (annual)".to_string(),
            stripe_plan_id: "plan_supporter_annual".to_string(),
            amount_cents: 25000,
            currency: "usd".to_string(),
            interval: BillingInterval::Year,
        },
        Plan {
            code: "donation-monthly".to_string(),
            name: "Monthly donation".to_string(),
            stripe_plan_id: "plan_donation_monthly".to_string(),
            amount_cents: 100,
            currency: "usd".to_string(),
            interval: BillingInterval::Month,
        },
    ]
});

/// Lookup table of offered plans.
#[derive(Debug, Clone)]
pub struct PlanCatalog {
    plans: Vec<Plan>,
}

impl PlanCatalog {
    /// Creates a catalog from an explicit plan list.
    pub fn new(plans: Vec<Plan>) -> Self {
        Self { plans }
    }

    /// The default catalog.
    pub fn standard() -> Self {
        Self {
            plans: STANDARD_PLANS.clone(),
        }
    }

    /// Finds a plan by catalog code.
    pub fn find(&self, code: &str) -> Option<&Plan> {
        self.plans.iter().find(|p| p.code == code)
    }

    /// Finds a plan by its processor-side identifier. Used to map processor
    /// responses and webhook payloads back to catalog codes.
    pub fn find_by_processor_id(&self, stripe_plan_id: &str) -> Option<&Plan> {
        self.plans.iter().find(|p| p.stripe_plan_id == stripe_plan_id)
    }

    /// Whether the catalog offers the given code.
    pub fn contains(&self, code: &str) -> bool {
        self.find(code).is_some()
    }

    /// All offered plans, in catalog order.
    pub fn plans(&self) -> &[Plan] {
        &self.plans
    }
}
