//! HTTP handler for the availability web service.

use axum::extract::{Path, Query, State};
use axum::response::IntoResponse;
use axum::Json;
use serde::Deserialize;

use crate::ports::UserAttribute;

use super::super::error::ApiError;
use super::super::AppState;

/// Query string of the availability check.
#[derive(Debug, Deserialize)]
pub struct AvailabilityParams {
    /// The value to check.
    #[serde(default)]
    pub v: String,
}

/// GET /a/check/available/:attr_name/ - JSON boolean, `true` when the value
/// is still available (no user has it).
pub async fn check_available(
    State(state): State<AppState>,
    Path(attr_name): Path<String>,
    Query(params): Query<AvailabilityParams>,
) -> Result<impl IntoResponse, ApiError> {
    let attribute: UserAttribute = attr_name
        .parse()
        .map_err(|err: String| ApiError::bad_request(err))?;

    let taken = state.directory.is_taken(attribute, &params.v).await?;

    // Available is the negation of taken; keep the negation in exactly one
    // place so the polarity cannot drift.
    Ok(Json(!taken))
}
