//! UserDirectory port - read-only lookups against the user store.
//!
//! Backs the availability-check web service: the directory answers whether a
//! username or email is already taken.

use async_trait::async_trait;
use std::str::FromStr;

use crate::domain::foundation::DomainError;

/// User attribute that can be checked for availability.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UserAttribute {
    Username,
    Email,
}

impl UserAttribute {
    /// Column name of the attribute in the user store.
    pub fn column(&self) -> &'static str {
        match self {
            UserAttribute::Username => "username",
            UserAttribute::Email => "email",
        }
    }
}

impl FromStr for UserAttribute {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "username" => Ok(UserAttribute::Username),
            "email" => Ok(UserAttribute::Email),
            other => Err(format!("unknown user attribute: {}", other)),
        }
    }
}

/// Port for user store lookups.
#[async_trait]
pub trait UserDirectory: Send + Sync {
    /// Whether some user already has `value` for the given attribute.
    async fn is_taken(&self, attribute: UserAttribute, value: &str) -> Result<bool, DomainError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn user_directory_is_object_safe() {
        fn _accepts_dyn(_dir: &dyn UserDirectory) {}
    }

    #[test]
    fn parses_known_attributes() {
        assert_eq!("username".parse(), Ok(UserAttribute::Username));
        assert_eq!("email".parse(), Ok(UserAttribute::Email));
    }

    #[test]
    fn rejects_unknown_attribute() {
        assert!("password".parse::<UserAttribute>().is_err());
    }
}
