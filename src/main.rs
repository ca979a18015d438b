//! Donation gateway server binary.

use std::sync::Arc;
use std::time::Duration;

use sqlx::postgres::PgPoolOptions;
use tower_http::cors::{Any, CorsLayer};
use tower_http::timeout::TimeoutLayer;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

use donation_gateway::adapters::http::{build_router, AppState};
use donation_gateway::adapters::postgres::{
    PostgresCustomerRepository, PostgresEventRepository, PostgresUserDirectory,
};
use donation_gateway::adapters::stripe::{SignatureVerifier, StripeGateway};
use donation_gateway::config::AppConfig;
use donation_gateway::domain::billing::PlanCatalog;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load()?;
    config.validate()?;

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(&config.server.log_level)
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!(
        environment = ?config.server.environment,
        test_mode = config.payment.is_test_mode(),
        "Starting donation gateway"
    );

    let pool = PgPoolOptions::new()
        .max_connections(config.database.max_connections)
        .acquire_timeout(Duration::from_secs(config.database.acquire_timeout_secs))
        .connect(&config.database.url)
        .await?;

    sqlx::migrate!("./migrations").run(&pool).await?;

    let state = AppState {
        customers: Arc::new(PostgresCustomerRepository::new(pool.clone())),
        events: Arc::new(PostgresEventRepository::new(pool.clone())),
        gateway: Arc::new(StripeGateway::new(&config.payment)),
        directory: Arc::new(PostgresUserDirectory::new(pool)),
        catalog: Arc::new(PlanCatalog::standard()),
        auth: Arc::new(config.auth.clone()),
        webhook_verifier: config
            .payment
            .webhook_secret
            .clone()
            .map(|secret| Arc::new(SignatureVerifier::new(secret))),
        webhook_path: config.payment.webhook_path.clone(),
        donation_plan: config.payment.donation_plan.clone(),
    };

    let mut app = build_router(state).layer(TimeoutLayer::new(Duration::from_secs(
        config.server.request_timeout_secs,
    )));

    if !config.server.cors_origins_list().is_empty() {
        // Origins are validated at startup; a parse failure is fatal.
        let origins = config
            .server
            .cors_origins_list()
            .iter()
            .map(|o| o.parse::<axum::http::HeaderValue>())
            .collect::<Result<Vec<_>, _>>()?;
        app = app.layer(
            CorsLayer::new()
                .allow_origin(origins)
                .allow_methods(Any)
                .allow_headers(Any),
        );
    }

    let addr = config.server.socket_addr();
    tracing::info!(%addr, "Listening");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
