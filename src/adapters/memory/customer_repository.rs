//! In-memory implementation of CustomerRepository.
//!
//! Honors the one-customer-per-user invariant the same way the PostgreSQL
//! implementation does through its uniqueness constraint. Used in tests and
//! local development.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;

use crate::domain::billing::{CurrentSubscription, Customer};
use crate::domain::foundation::{CustomerId, DomainError, UserId};
use crate::ports::{CustomerRepository, GetOrCreate};

/// In-memory customer store.
#[derive(Default)]
pub struct InMemoryCustomerRepository {
    customers: Mutex<Vec<Customer>>,
    subscriptions: Mutex<HashMap<CustomerId, CurrentSubscription>>,
}

impl InMemoryCustomerRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store pre-seeded with one customer.
    pub fn with_customer(customer: Customer) -> Self {
        let repo = Self::new();
        repo.customers.lock().unwrap().push(customer);
        repo
    }
}

#[async_trait]
impl CustomerRepository for InMemoryCustomerRepository {
    async fn get_or_create(&self, candidate: Customer) -> Result<GetOrCreate, DomainError> {
        let mut customers = self.customers.lock().unwrap();
        if let Some(existing) = customers.iter().find(|c| c.user_id == candidate.user_id) {
            return Ok(GetOrCreate {
                customer: existing.clone(),
                created: false,
            });
        }
        customers.push(candidate.clone());
        Ok(GetOrCreate {
            customer: candidate,
            created: true,
        })
    }

    async fn find_by_user_id(&self, user_id: &UserId) -> Result<Option<Customer>, DomainError> {
        Ok(self
            .customers
            .lock()
            .unwrap()
            .iter()
            .find(|c| &c.user_id == user_id)
            .cloned())
    }

    async fn find_by_stripe_id(&self, stripe_id: &str) -> Result<Option<Customer>, DomainError> {
        Ok(self
            .customers
            .lock()
            .unwrap()
            .iter()
            .find(|c| c.stripe_id == stripe_id)
            .cloned())
    }

    async fn update(&self, customer: &Customer) -> Result<(), DomainError> {
        let mut customers = self.customers.lock().unwrap();
        if let Some(existing) = customers.iter_mut().find(|c| c.id == customer.id) {
            *existing = customer.clone();
        }
        Ok(())
    }

    async fn subscription_for(
        &self,
        customer_id: &CustomerId,
    ) -> Result<Option<CurrentSubscription>, DomainError> {
        Ok(self.subscriptions.lock().unwrap().get(customer_id).cloned())
    }

    async fn put_subscription(
        &self,
        customer_id: &CustomerId,
        subscription: &CurrentSubscription,
    ) -> Result<(), DomainError> {
        self.subscriptions
            .lock()
            .unwrap()
            .insert(*customer_id, subscription.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_customer() -> Customer {
        Customer::link(UserId::new("user-1").unwrap(), "cus_1")
    }

    #[tokio::test]
    async fn get_or_create_inserts_once_per_user() {
        let repo = InMemoryCustomerRepository::new();

        let first = repo.get_or_create(test_customer()).await.unwrap();
        assert!(first.created);

        let second = repo.get_or_create(test_customer()).await.unwrap();
        assert!(!second.created);
        assert_eq!(second.customer.id, first.customer.id);
    }

    #[tokio::test]
    async fn finds_by_both_identifiers() {
        let repo = InMemoryCustomerRepository::with_customer(test_customer());

        let by_user = repo
            .find_by_user_id(&UserId::new("user-1").unwrap())
            .await
            .unwrap();
        let by_stripe = repo.find_by_stripe_id("cus_1").await.unwrap();

        assert_eq!(by_user, by_stripe);
        assert!(by_user.is_some());
    }
}
