//! Donation value objects.
//!
//! Donations are pass-through operations: the donor's details and card token
//! go straight to the processor and nothing is persisted locally. These types
//! validate the submitted form data before any processor call is made.

use std::collections::HashMap;

use crate::domain::foundation::ValidationError;

/// Donor details collected by both donation forms.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DonorInfo {
    pub first_name: String,
    pub last_name: String,
    pub full_name: String,
    pub email: String,
    pub designations: String,
    pub additional_infos: Vec<String>,
    pub comment: String,
}

impl DonorInfo {
    /// Renders the donor details as processor metadata.
    pub fn metadata(&self) -> HashMap<String, String> {
        let mut metadata = HashMap::new();
        metadata.insert("firstname".to_string(), self.first_name.clone());
        metadata.insert("lastname".to_string(), self.last_name.clone());
        metadata.insert("name".to_string(), self.full_name.clone());
        metadata.insert("email".to_string(), self.email.clone());
        metadata.insert(
            "donationDesignations".to_string(),
            self.designations.clone(),
        );
        metadata.insert(
            "additionalInfos".to_string(),
            self.additional_infos.join(","),
        );
        metadata.insert("comment".to_string(), self.comment.clone());
        metadata
    }
}

/// A validated one-time donation request.
#[derive(Debug, Clone, PartialEq)]
pub struct OneTimeDonation {
    pub donor: DonorInfo,

    /// Donated amount in whole dollars.
    pub amount_dollars: i64,

    /// Card token from the payment form.
    pub card_token: String,
}

impl OneTimeDonation {
    /// Validates and constructs a one-time donation.
    pub fn new(
        donor: DonorInfo,
        amount_dollars: i64,
        card_token: impl Into<String>,
    ) -> Result<Self, ValidationError> {
        if donor.email.is_empty() {
            return Err(ValidationError::empty_field("email"));
        }
        let card_token = card_token.into();
        if card_token.is_empty() {
            return Err(ValidationError::empty_field("card_token"));
        }
        if amount_dollars < 1 {
            return Err(ValidationError::invalid_format(
                "amount",
                "must be at least 1",
            ));
        }
        Ok(Self {
            donor,
            amount_dollars,
            card_token,
        })
    }

    /// The amount in cents, as the processor expects.
    pub fn amount_cents(&self) -> i64 {
        self.amount_dollars * 100
    }
}

/// A validated recurring (monthly) donation request.
///
/// The donated amount is expressed as the subscription quantity on a fixed
/// one-dollar-per-unit plan.
#[derive(Debug, Clone, PartialEq)]
pub struct MonthlyDonation {
    pub donor: DonorInfo,

    /// Subscription quantity; one unit per donated dollar.
    pub quantity: i64,

    /// Card token from the payment form.
    pub card_token: String,
}

impl MonthlyDonation {
    /// Validates and constructs a monthly donation. The raw amount string
    /// comes straight from the form; anything unusable becomes quantity 1.
    pub fn new(
        donor: DonorInfo,
        raw_amount: Option<&str>,
        card_token: impl Into<String>,
    ) -> Result<Self, ValidationError> {
        if donor.email.is_empty() {
            return Err(ValidationError::empty_field("email"));
        }
        let card_token = card_token.into();
        if card_token.is_empty() {
            return Err(ValidationError::empty_field("card_token"));
        }
        Ok(Self {
            donor,
            quantity: parse_quantity(raw_amount),
            card_token,
        })
    }
}

/// Parses a donation quantity from raw form input.
///
/// Malformed, missing, zero, or negative input defaults to 1; this must
/// never raise.
pub fn parse_quantity(raw: Option<&str>) -> i64 {
    match raw.map(str::trim).and_then(|s| s.parse::<i64>().ok()) {
        Some(n) if n >= 1 => n,
        _ => 1,
    }
}
