//! CustomerRepository port - persistent storage for billing customers.
//!
//! The repository enforces the one-Customer-per-user invariant through a
//! uniqueness constraint on `user_id`, which also makes the lazy
//! `get_or_create` pattern safe under concurrent first access: whichever
//! insert wins is returned to everyone.

use async_trait::async_trait;

use crate::domain::billing::{CurrentSubscription, Customer};
use crate::domain::foundation::{CustomerId, DomainError, UserId};

/// Result of [`CustomerRepository::get_or_create`], making create-vs-fetch
/// explicit for callers.
#[derive(Debug, Clone)]
pub struct GetOrCreate {
    /// The authoritative stored customer.
    pub customer: Customer,

    /// True when `candidate` was inserted; false when an existing row won.
    pub created: bool,
}

/// Port for storing and retrieving billing customers.
#[async_trait]
pub trait CustomerRepository: Send + Sync {
    /// Insert `candidate` if the user has no customer yet, otherwise return
    /// the existing record.
    ///
    /// Implementations must resolve concurrent first-access races through the
    /// `user_id` uniqueness constraint: the losing insert fetches and returns
    /// the winner's row with `created = false`.
    async fn get_or_create(&self, candidate: Customer) -> Result<GetOrCreate, DomainError>;

    /// Find the customer owned by a user.
    async fn find_by_user_id(&self, user_id: &UserId) -> Result<Option<Customer>, DomainError>;

    /// Find the customer mirroring a processor customer id.
    async fn find_by_stripe_id(&self, stripe_id: &str) -> Result<Option<Customer>, DomainError>;

    /// Persist updated card details and timestamps.
    async fn update(&self, customer: &Customer) -> Result<(), DomainError>;

    /// The customer's current subscription, if any.
    async fn subscription_for(
        &self,
        customer_id: &CustomerId,
    ) -> Result<Option<CurrentSubscription>, DomainError>;

    /// Insert or replace the customer's current subscription.
    async fn put_subscription(
        &self,
        customer_id: &CustomerId,
        subscription: &CurrentSubscription,
    ) -> Result<(), DomainError>;
}
