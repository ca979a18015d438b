//! Webhook HTTP handler.
//!
//! The endpoint ALWAYS acknowledges with 200 and an empty body, even when
//! verification, validation, or processing fails: the delivery (or its
//! failure) is durably recorded, and a non-2xx response would only make the
//! processor redeliver an event we already have.

use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use serde_json::Value;

use crate::domain::webhook::IncomingEvent;
use crate::ports::ExceptionRecord;

use super::super::AppState;

/// POST <webhook_path> - receive a processor webhook delivery.
pub async fn receive_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> StatusCode {
    // 1. Signature check, when a signing secret is configured. Failures are
    //    recorded and acknowledged; the delivery is not stored as an Event.
    if let Some(verifier) = &state.webhook_verifier {
        let signature = headers
            .get("Stripe-Signature")
            .and_then(|v| v.to_str().ok())
            .unwrap_or("");

        if let Err(err) = verifier.verify(&body, signature) {
            tracing::warn!(error = %err, "Webhook signature verification failed");
            record_exception(
                &state,
                parse_lossy(&body),
                "Webhook signature verification failed",
                err.to_string(),
            )
            .await;
            return StatusCode::OK;
        }
    }

    // 2. Parse the envelope
    let payload: Value = match serde_json::from_slice(&body) {
        Ok(payload) => payload,
        Err(err) => {
            tracing::warn!(error = %err, "Webhook body is not JSON");
            record_exception(
                &state,
                parse_lossy(&body),
                "Webhook body is not valid JSON",
                err.to_string(),
            )
            .await;
            return StatusCode::OK;
        }
    };

    let event = match IncomingEvent::parse(payload.clone()) {
        Ok(event) => event,
        Err(err) => {
            tracing::warn!(error = %err, "Webhook body is not an event envelope");
            record_exception(&state, payload, "Malformed webhook event", err.to_string()).await;
            return StatusCode::OK;
        }
    };

    // 3. Record, validate, process. Outcomes are logged; the response does
    //    not depend on them.
    match state.webhook_processor().receive(event).await {
        Ok(outcome) => {
            tracing::info!(?outcome, "Webhook delivery handled");
        }
        Err(err) => {
            tracing::error!(error = %err, "Webhook recording failed");
        }
    }

    StatusCode::OK
}

fn parse_lossy(body: &[u8]) -> Value {
    serde_json::from_slice(body)
        .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(body).into_owned()))
}

async fn record_exception(state: &AppState, payload: Value, message: &str, traceback: String) {
    if let Err(err) = state
        .events
        .record_exception(ExceptionRecord::new(payload, message).with_traceback(traceback))
        .await
    {
        tracing::error!(error = %err, "Failed to record webhook exception");
    }
}
