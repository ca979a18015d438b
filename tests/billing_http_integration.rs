//! HTTP integration tests for billing and donation endpoints.

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use secrecy::SecretString;
use serde_json::{json, Value};
use tower::ServiceExt;

use donation_gateway::adapters::http::middleware::issue_token;
use donation_gateway::adapters::http::{build_router, AppState};
use donation_gateway::adapters::memory::{
    InMemoryCustomerRepository, InMemoryEventRepository, InMemoryUserDirectory,
};
use donation_gateway::adapters::stripe::MockPaymentGateway;
use donation_gateway::config::AuthConfig;
use donation_gateway::domain::billing::{PlanCatalog, SubscriptionStatus};

struct TestApp {
    router: Router,
    gateway: Arc<MockPaymentGateway>,
    auth: Arc<AuthConfig>,
}

fn app_with_gateway(gateway: MockPaymentGateway) -> TestApp {
    let gateway = Arc::new(gateway);
    let auth = Arc::new(AuthConfig {
        token_secret: SecretString::new("0123456789abcdef0123456789abcdef".to_string()),
        issuer: "donation-gateway".to_string(),
    });

    let state = AppState {
        customers: Arc::new(InMemoryCustomerRepository::new()),
        events: Arc::new(InMemoryEventRepository::new()),
        gateway: gateway.clone(),
        directory: Arc::new(InMemoryUserDirectory::new()),
        catalog: Arc::new(PlanCatalog::standard()),
        auth: auth.clone(),
        webhook_verifier: None,
        webhook_path: "/webhook/".to_string(),
        donation_plan: "donation-monthly".to_string(),
    };

    TestApp {
        router: build_router(state),
        gateway,
        auth,
    }
}

fn test_app() -> TestApp {
    app_with_gateway(MockPaymentGateway::new())
}

fn bearer(app: &TestApp) -> String {
    let token = issue_token(&app.auth, "user-1", "subscriber@example.com", "subscriber").unwrap();
    format!("Bearer {}", token)
}

async fn send(app: &TestApp, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, body)
}

fn post_json(uri: &str, auth: Option<&str>, body: &Value) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json");
    if let Some(auth) = auth {
        builder = builder.header("authorization", auth);
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

// ══════════════════════════════════════════════════════════════
// Authentication
// ══════════════════════════════════════════════════════════════

#[tokio::test]
async fn account_requires_authentication() {
    let app = test_app();

    let (status, body) = send(
        &app,
        Request::builder()
            .uri("/account/")
            .body(Body::empty())
            .unwrap(),
    )
    .await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "AUTHENTICATION_REQUIRED");
}

#[tokio::test]
async fn donations_are_anonymous() {
    let app = test_app();

    let (status, body) = send(
        &app,
        post_json(
            "/donate/onetime/",
            None,
            &json!({
                "email": "donor@example.com",
                "amount": 10,
                "stripe_token": "tok_visa"
            }),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Thanks for your donation!");
}

// ══════════════════════════════════════════════════════════════
// Subscription lifecycle
// ══════════════════════════════════════════════════════════════

#[tokio::test]
async fn subscribe_then_account_shows_subscription() {
    let app = test_app();
    let auth = bearer(&app);

    let (status, body) = send(
        &app,
        post_json(
            "/subscribe/",
            Some(&auth),
            &json!({"plan": "supporter-monthly", "stripe_token": "tok_visa"}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "You are now subscribed!");
    assert_eq!(body["subscription"]["plan"], "supporter-monthly");

    let (status, body) = send(
        &app,
        Request::builder()
            .uri("/account/")
            .header("authorization", &auth)
            .body(Body::empty())
            .unwrap(),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["subscription"]["status"], "active");
    assert_eq!(body["customer"]["has_card"], true);
    assert!(body["plans"].as_array().unwrap().len() >= 3);
}

#[tokio::test]
async fn subscribe_with_unknown_plan_is_a_form_error() {
    let app = test_app();
    let auth = bearer(&app);

    let (status, body) = send(
        &app,
        post_json(
            "/subscribe/",
            Some(&auth),
            &json!({"plan": "gold-plated", "stripe_token": "tok_visa"}),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(body["message"].as_str().unwrap().contains("gold-plated"));
}

#[tokio::test]
async fn declined_card_surfaces_processor_message() {
    let app = app_with_gateway(MockPaymentGateway::with_declined_card(
        "Your card was declined.",
    ));
    let auth = bearer(&app);

    let (status, body) = send(
        &app,
        post_json(
            "/subscribe/",
            Some(&auth),
            &json!({"plan": "supporter-monthly", "stripe_token": "tok_bad"}),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["error"], "CARD_DECLINED");
    assert_eq!(body["message"], "Your card was declined.");
}

#[tokio::test]
async fn cancel_reports_pending_status_until_period_end() {
    let app = test_app();
    let auth = bearer(&app);

    // Establish a subscriber first.
    send(
        &app,
        post_json(
            "/subscribe/",
            Some(&auth),
            &json!({"plan": "supporter-monthly", "stripe_token": "tok_visa"}),
        ),
    )
    .await;

    let (status, body) = send(
        &app,
        post_json("/cancel/subscription/", Some(&auth), &json!({})),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "active");
    assert!(body["message"].as_str().unwrap().contains("until"));
    assert_eq!(body["current_period_end"], 1706745600);
}

#[tokio::test]
async fn cancel_reports_terminal_state_when_fully_cancelled() {
    let app = test_app();
    *app.gateway.cancel_status.lock().unwrap() = SubscriptionStatus::Cancelled;
    let auth = bearer(&app);

    send(
        &app,
        post_json(
            "/subscribe/",
            Some(&auth),
            &json!({"plan": "supporter-monthly", "stripe_token": "tok_visa"}),
        ),
    )
    .await;

    let (status, body) = send(
        &app,
        post_json("/cancel/subscription/", Some(&auth), &json!({})),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Your account is now cancelled.");
    assert_eq!(body["status"], "cancelled");
}

#[tokio::test]
async fn first_card_update_sends_invoice_later_ones_do_not() {
    let app = test_app();
    let auth = bearer(&app);

    let (status, body) = send(
        &app,
        post_json(
            "/change/card/",
            Some(&auth),
            &json!({"stripe_token": "tok_visa"}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["invoice_sent"], true);
    assert_eq!(app.gateway.invoice_create_count(), 1);

    let (status, body) = send(
        &app,
        post_json(
            "/change/card/",
            Some(&auth),
            &json!({"stripe_token": "tok_mastercard"}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["invoice_sent"], false);
    assert_eq!(app.gateway.invoice_create_count(), 1);
}

#[tokio::test]
async fn change_plan_requires_existing_customer() {
    let app = test_app();
    let auth = bearer(&app);

    let (status, _) = send(
        &app,
        post_json(
            "/change/plan/",
            Some(&auth),
            &json!({"plan": "supporter-annual"}),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::NOT_FOUND);
}

// ══════════════════════════════════════════════════════════════
// Donations
// ══════════════════════════════════════════════════════════════

#[tokio::test]
async fn monthly_donation_defaults_malformed_amount_to_one() {
    let app = test_app();

    let (status, body) = send(
        &app,
        post_json(
            "/donate/monthly/",
            None,
            &json!({
                "fullname": "Ada Lovelace",
                "email": "ada@example.com",
                "amount": "lots!",
                "stripe_token": "tok_visa"
            }),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["quantity"], 1);
    assert_eq!(
        app.gateway.created_customers.lock().unwrap()[0].quantity,
        Some(1)
    );
}

#[tokio::test]
async fn monthly_donation_uses_submitted_amount_as_quantity() {
    let app = test_app();

    let (status, body) = send(
        &app,
        post_json(
            "/donate/monthly/",
            None,
            &json!({
                "fullname": "Ada Lovelace",
                "email": "ada@example.com",
                "amount": 20,
                "stripe_token": "tok_visa"
            }),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["quantity"], 20);

    let created = app.gateway.created_customers.lock().unwrap();
    assert_eq!(created[0].plan.as_deref(), Some("plan_donation_monthly"));
}

#[tokio::test]
async fn one_time_donation_invoices_the_amount() {
    let app = test_app();

    let (status, _) = send(
        &app,
        post_json(
            "/donate/onetime/",
            None,
            &json!({
                "firstname": "Ada",
                "lastname": "Lovelace",
                "name": "Ada Lovelace",
                "email": "ada@example.com",
                "donationDesignations": "general",
                "additionalInfos": ["newsletter"],
                "comment": "",
                "amount": 25,
                "stripe_token": "tok_visa"
            }),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    let items = app.gateway.created_invoice_items.lock().unwrap();
    assert_eq!(items[0].amount_cents, 2500);
    assert_eq!(app.gateway.paid_invoices.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn one_time_donation_rejects_zero_amount() {
    let app = test_app();

    let (status, _) = send(
        &app,
        post_json(
            "/donate/onetime/",
            None,
            &json!({
                "email": "ada@example.com",
                "amount": 0,
                "stripe_token": "tok_visa"
            }),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn root_redirects_to_donation_page() {
    let app = test_app();

    let response = app
        .router
        .clone()
        .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(
        response.headers().get("location").unwrap(),
        "/donate/onetime/"
    );
}

#[tokio::test]
async fn thanks_page_is_static() {
    let app = test_app();

    let (status, body) = send(
        &app,
        Request::builder()
            .uri("/donate/thanks/")
            .body(Body::empty())
            .unwrap(),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Thanks for your donation!");
}
