//! HTTP handlers for donation endpoints.

use axum::extract::State;
use axum::response::IntoResponse;
use axum::Json;

use crate::domain::donation::{MonthlyDonation, OneTimeDonation};

use super::super::error::ApiError;
use super::super::AppState;
use super::dto::{DonationResponse, MonthlyDonationRequest, OneTimeDonationRequest};

/// POST /donate/onetime/ - collect a one-time donation.
pub async fn donate_one_time(
    State(state): State<AppState>,
    Json(request): Json<OneTimeDonationRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let donation = OneTimeDonation::new(request.donor(), request.amount, &request.stripe_token)?;

    state.donate_one_time_handler().handle(donation).await?;

    Ok(Json(DonationResponse {
        message: "Thanks for your donation!".to_string(),
        quantity: None,
    }))
}

/// POST /donate/monthly/ - start a recurring donation.
pub async fn donate_monthly(
    State(state): State<AppState>,
    Json(request): Json<MonthlyDonationRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let raw_amount = request.raw_amount();
    let donation = MonthlyDonation::new(
        request.donor(),
        raw_amount.as_deref(),
        &request.stripe_token,
    )?;

    let receipt = state.donate_monthly_handler().handle(donation).await?;

    Ok(Json(DonationResponse {
        message: "Thanks for your donation!".to_string(),
        quantity: Some(receipt.quantity),
    }))
}

/// GET /donate/thanks/ - static acknowledgement.
pub async fn thanks() -> impl IntoResponse {
    Json(DonationResponse {
        message: "Thanks for your donation!".to_string(),
        quantity: None,
    })
}
