//! Customer aggregate - local mirror of a payment processor customer.
//!
//! Exactly one Customer exists per local user (enforced by a uniqueness
//! constraint at the storage layer). The record holds the processor customer
//! id and the fingerprint of the card currently on file; an empty fingerprint
//! means no card has been attached yet.

use serde::{Deserialize, Serialize};

use crate::domain::foundation::{CustomerId, Timestamp, UserId};

/// Local billing customer, one per user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Customer {
    pub id: CustomerId,

    /// Owning local user.
    pub user_id: UserId,

    /// Processor-side customer id (cus_...).
    pub stripe_id: String,

    /// Fingerprint of the card on file. Empty string when no card is stored.
    pub card_fingerprint: String,

    /// Last four digits of the card on file.
    pub card_last_4: String,

    /// Card brand as reported by the processor (e.g. "Visa").
    pub card_kind: String,

    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Customer {
    /// Creates a customer linked to a freshly created processor customer.
    ///
    /// The new record has no card on file.
    pub fn link(user_id: UserId, stripe_id: impl Into<String>) -> Self {
        let now = Timestamp::now();
        Self {
            id: CustomerId::new(),
            user_id,
            stripe_id: stripe_id.into(),
            card_fingerprint: String::new(),
            card_last_4: String::new(),
            card_kind: String::new(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Whether a card is currently on file.
    pub fn has_card(&self) -> bool {
        !self.card_fingerprint.is_empty()
    }

    /// Replaces the stored card details after the processor accepted a token.
    pub fn set_card(
        &mut self,
        fingerprint: impl Into<String>,
        last_4: impl Into<String>,
        kind: impl Into<String>,
    ) {
        self.card_fingerprint = fingerprint.into();
        self.card_last_4 = last_4.into();
        self.card_kind = kind.into();
        self.updated_at = Timestamp::now();
    }

    /// Clears the stored card details.
    pub fn clear_card(&mut self) {
        self.card_fingerprint = String::new();
        self.card_last_4 = String::new();
        self.card_kind = String::new();
        self.updated_at = Timestamp::now();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_customer() -> Customer {
        Customer::link(UserId::new("user-1").unwrap(), "cus_123")
    }

    #[test]
    fn linked_customer_has_no_card() {
        let customer = test_customer();
        assert!(!customer.has_card());
        assert_eq!(customer.stripe_id, "cus_123");
    }

    #[test]
    fn set_card_stores_details() {
        let mut customer = test_customer();
        customer.set_card("fp_abc", "4242", "Visa");

        assert!(customer.has_card());
        assert_eq!(customer.card_last_4, "4242");
        assert_eq!(customer.card_kind, "Visa");
    }

    #[test]
    fn clear_card_removes_details() {
        let mut customer = test_customer();
        customer.set_card("fp_abc", "4242", "Visa");
        customer.clear_card();

        assert!(!customer.has_card());
        assert_eq!(customer.card_last_4, "");
    }
}
