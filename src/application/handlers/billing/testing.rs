//! Shared fixtures for handler tests.

pub use crate::adapters::memory::InMemoryCustomerRepository as MockCustomerRepository;
pub use crate::adapters::stripe::{
    active_subscription, test_card, unpaid_invoice, MockPaymentGateway as MockGateway,
};

use crate::domain::billing::Customer;
use crate::domain::foundation::UserId;

pub fn test_user_id() -> UserId {
    UserId::new("user-test-1").unwrap()
}

/// A customer linked to the processor but with no card on file.
pub fn linked_customer() -> Customer {
    Customer::link(test_user_id(), "cus_existing")
}

/// A customer with a card already on file.
pub fn customer_with_card() -> Customer {
    let mut customer = linked_customer();
    customer.set_card("fp_old", "1881", "Visa");
    customer
}
