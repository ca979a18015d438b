//! Request/response DTOs for donation endpoints.
//!
//! Field names mirror the donation form fields, including the camelCase
//! metadata keys the forms have always used.

use serde::{Deserialize, Serialize};

use crate::domain::donation::DonorInfo;

/// POST /donate/onetime/ body.
#[derive(Debug, Clone, Deserialize)]
pub struct OneTimeDonationRequest {
    #[serde(default)]
    pub firstname: String,

    #[serde(default)]
    pub lastname: String,

    #[serde(default)]
    pub name: String,

    #[serde(default)]
    pub email: String,

    #[serde(default, rename = "donationDesignations")]
    pub donation_designations: String,

    #[serde(default, rename = "additionalInfos")]
    pub additional_infos: Vec<String>,

    #[serde(default)]
    pub comment: String,

    /// Donated amount in whole dollars.
    pub amount: i64,

    pub stripe_token: String,
}

impl OneTimeDonationRequest {
    pub fn donor(&self) -> DonorInfo {
        DonorInfo {
            first_name: self.firstname.clone(),
            last_name: self.lastname.clone(),
            full_name: self.name.clone(),
            email: self.email.clone(),
            designations: self.donation_designations.clone(),
            additional_infos: self.additional_infos.clone(),
            comment: self.comment.clone(),
        }
    }
}

/// POST /donate/monthly/ body.
#[derive(Debug, Clone, Deserialize)]
pub struct MonthlyDonationRequest {
    #[serde(default)]
    pub fullname: String,

    #[serde(default)]
    pub email: String,

    #[serde(default, rename = "donationDesignations")]
    pub donation_designations: String,

    #[serde(default, rename = "additionalInfos")]
    pub additional_infos: Vec<String>,

    #[serde(default)]
    pub comment: String,

    /// Raw amount field. Deliberately untyped: malformed input must default
    /// the subscription quantity to 1 rather than fail deserialization.
    #[serde(default)]
    pub amount: Option<serde_json::Value>,

    pub stripe_token: String,
}

impl MonthlyDonationRequest {
    pub fn donor(&self) -> DonorInfo {
        DonorInfo {
            first_name: String::new(),
            last_name: String::new(),
            full_name: self.fullname.clone(),
            email: self.email.clone(),
            designations: self.donation_designations.clone(),
            additional_infos: self.additional_infos.clone(),
            comment: self.comment.clone(),
        }
    }

    /// The raw amount as a string, if any was submitted.
    pub fn raw_amount(&self) -> Option<String> {
        match &self.amount {
            Some(serde_json::Value::String(s)) => Some(s.clone()),
            Some(serde_json::Value::Number(n)) => Some(n.to_string()),
            _ => None,
        }
    }
}

/// Response for completed donations.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DonationResponse {
    pub message: String,

    /// Subscribed quantity; only set for monthly donations.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quantity: Option<i64>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn one_time_request_parses_form_fields() {
        let request: OneTimeDonationRequest = serde_json::from_value(json!({
            "firstname": "Ada",
            "lastname": "Lovelace",
            "name": "Ada Lovelace",
            "email": "ada@example.com",
            "donationDesignations": "general",
            "additionalInfos": ["newsletter"],
            "comment": "",
            "amount": 25,
            "stripe_token": "tok_visa"
        }))
        .unwrap();

        let donor = request.donor();
        assert_eq!(donor.designations, "general");
        assert_eq!(request.amount, 25);
    }

    #[test]
    fn monthly_amount_accepts_strings_and_numbers() {
        let request: MonthlyDonationRequest = serde_json::from_value(json!({
            "email": "a@example.com",
            "amount": "12",
            "stripe_token": "tok_visa"
        }))
        .unwrap();
        assert_eq!(request.raw_amount().as_deref(), Some("12"));

        let request: MonthlyDonationRequest = serde_json::from_value(json!({
            "email": "a@example.com",
            "amount": 7,
            "stripe_token": "tok_visa"
        }))
        .unwrap();
        assert_eq!(request.raw_amount().as_deref(), Some("7"));
    }

    #[test]
    fn monthly_amount_tolerates_garbage() {
        let request: MonthlyDonationRequest = serde_json::from_value(json!({
            "email": "a@example.com",
            "amount": {"weird": true},
            "stripe_token": "tok_visa"
        }))
        .unwrap();
        assert_eq!(request.raw_amount(), None);

        let request: MonthlyDonationRequest = serde_json::from_value(json!({
            "email": "a@example.com",
            "stripe_token": "tok_visa"
        }))
        .unwrap();
        assert_eq!(request.raw_amount(), None);
    }
}
