//! CurrentSubscription - the zero-or-one active subscription of a Customer.
//!
//! State transitions are driven by processor responses and webhook events;
//! the local record mirrors what the processor last reported. Absence of a
//! subscription is a valid state.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::domain::foundation::Timestamp;

/// Subscription status as reported by the payment processor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubscriptionStatus {
    Trialing,
    Active,
    PastDue,
    Cancelled,
    Unpaid,
    /// Status string the processor sent that we do not recognize.
    Unknown,
}

impl SubscriptionStatus {
    /// Parses a processor status string. Both US and UK spellings of
    /// "canceled" appear in processor payloads.
    pub fn parse(s: &str) -> Self {
        match s {
            "trialing" => SubscriptionStatus::Trialing,
            "active" => SubscriptionStatus::Active,
            "past_due" => SubscriptionStatus::PastDue,
            "canceled" | "cancelled" => SubscriptionStatus::Cancelled,
            "unpaid" => SubscriptionStatus::Unpaid,
            _ => SubscriptionStatus::Unknown,
        }
    }

    /// Whether this status still grants access to the subscribed service.
    pub fn has_access(&self) -> bool {
        matches!(
            self,
            SubscriptionStatus::Trialing | SubscriptionStatus::Active | SubscriptionStatus::PastDue
        )
    }

    /// Whether this status is terminal. A subscription pending cancellation
    /// at period end is NOT terminal; only a fully cancelled one is.
    pub fn is_terminal(&self) -> bool {
        matches!(self, SubscriptionStatus::Cancelled)
    }
}

impl fmt::Display for SubscriptionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            SubscriptionStatus::Trialing => "trialing",
            SubscriptionStatus::Active => "active",
            SubscriptionStatus::PastDue => "past_due",
            SubscriptionStatus::Cancelled => "cancelled",
            SubscriptionStatus::Unpaid => "unpaid",
            SubscriptionStatus::Unknown => "unknown",
        };
        write!(f, "{}", s)
    }
}

/// The subscription a Customer currently holds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurrentSubscription {
    /// Plan code from the catalog.
    pub plan: String,

    /// Subscribed quantity (used for recurring donations).
    pub quantity: i64,

    pub status: SubscriptionStatus,

    /// Current billing period boundaries.
    pub current_period_start: Timestamp,
    pub current_period_end: Timestamp,

    /// Per-period amount in cents.
    pub amount_cents: i64,

    /// ISO currency code, lowercase.
    pub currency: String,

    /// True when a cancellation at period end has been requested.
    pub cancel_at_period_end: bool,

    /// When cancellation was requested, if any.
    pub canceled_at: Option<Timestamp>,

    /// When the subscription started.
    pub start: Timestamp,
}

impl CurrentSubscription {
    /// Marks the subscription fully cancelled.
    pub fn mark_cancelled(&mut self, at: Timestamp) {
        self.status = SubscriptionStatus::Cancelled;
        self.canceled_at = Some(at);
    }

    /// Whether access is still granted (pending cancellation keeps access
    /// until the period ends).
    pub fn has_access(&self) -> bool {
        self.status.has_access()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn active_subscription() -> CurrentSubscription {
        CurrentSubscription {
            plan: "supporter-monthly".to_string(),
            quantity: 1,
            status: SubscriptionStatus::Active,
            current_period_start: Timestamp::from_unix_secs(1704067200),
            current_period_end: Timestamp::from_unix_secs(1706745600),
            amount_cents: 2500,
            currency: "usd".to_string(),
            cancel_at_period_end: false,
            canceled_at: None,
            start: Timestamp::from_unix_secs(1704067200),
        }
    }

    #[test]
    fn parse_recognizes_both_cancelled_spellings() {
        assert_eq!(
            SubscriptionStatus::parse("canceled"),
            SubscriptionStatus::Cancelled
        );
        assert_eq!(
            SubscriptionStatus::parse("cancelled"),
            SubscriptionStatus::Cancelled
        );
    }

    #[test]
    fn parse_unknown_status_maps_to_unknown() {
        assert_eq!(
            SubscriptionStatus::parse("incomplete_expired"),
            SubscriptionStatus::Unknown
        );
    }

    #[test]
    fn access_statuses() {
        assert!(SubscriptionStatus::Active.has_access());
        assert!(SubscriptionStatus::Trialing.has_access());
        assert!(SubscriptionStatus::PastDue.has_access());

        assert!(!SubscriptionStatus::Cancelled.has_access());
        assert!(!SubscriptionStatus::Unpaid.has_access());
    }

    #[test]
    fn only_cancelled_is_terminal() {
        assert!(SubscriptionStatus::Cancelled.is_terminal());
        assert!(!SubscriptionStatus::PastDue.is_terminal());
        assert!(!SubscriptionStatus::Active.is_terminal());
    }

    #[test]
    fn mark_cancelled_sets_status_and_time() {
        let mut sub = active_subscription();
        let now = Timestamp::now();
        sub.mark_cancelled(now);

        assert_eq!(sub.status, SubscriptionStatus::Cancelled);
        assert_eq!(sub.canceled_at, Some(now));
    }

    #[test]
    fn pending_cancellation_keeps_access() {
        let mut sub = active_subscription();
        sub.cancel_at_period_end = true;
        sub.canceled_at = Some(Timestamp::now());

        // Status stays active until the processor ends the period.
        assert!(sub.has_access());
        assert!(!sub.status.is_terminal());
    }
}
