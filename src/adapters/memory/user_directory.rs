//! In-memory implementation of UserDirectory.

use async_trait::async_trait;
use std::sync::Mutex;

use crate::domain::foundation::DomainError;
use crate::ports::{UserAttribute, UserDirectory};

/// In-memory user store for availability checks.
#[derive(Default)]
pub struct InMemoryUserDirectory {
    users: Mutex<Vec<(String, String)>>,
}

impl InMemoryUserDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a user with the given username and email.
    pub fn add_user(&self, username: impl Into<String>, email: impl Into<String>) {
        self.users
            .lock()
            .unwrap()
            .push((username.into(), email.into()));
    }
}

#[async_trait]
impl UserDirectory for InMemoryUserDirectory {
    async fn is_taken(&self, attribute: UserAttribute, value: &str) -> Result<bool, DomainError> {
        let users = self.users.lock().unwrap();
        Ok(users.iter().any(|(username, email)| match attribute {
            UserAttribute::Username => username == value,
            UserAttribute::Email => email == value,
        }))
    }
}
