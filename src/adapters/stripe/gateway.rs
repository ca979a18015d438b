//! Stripe payment gateway adapter.
//!
//! Implements the `PaymentGateway` trait against the Stripe REST API.
//! Authentication uses HTTP basic auth with the secret key; request bodies
//! are form-encoded.

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};

use crate::config::PaymentConfig;
use crate::ports::{
    CreateCustomerRequest, CreateInvoiceItemRequest, CreateSubscriptionRequest, GatewayCard,
    GatewayCustomer, GatewayError, GatewayErrorCode, GatewayEvent, GatewayInvoice,
    GatewaySubscription, PaymentGateway,
};

use super::api_types::{
    StripeCustomer, StripeErrorBody, StripeEventEnvelope, StripeInvoice, StripeList,
    StripeSubscription,
};

/// Stripe implementation of the payment gateway port.
pub struct StripeGateway {
    api_key: SecretString,
    api_base_url: String,
    http_client: reqwest::Client,
}

impl StripeGateway {
    /// Creates a gateway from the payment configuration.
    pub fn new(config: &PaymentConfig) -> Self {
        Self {
            api_key: config.secret_key.clone(),
            api_base_url: config.api_base_url.clone(),
            http_client: reqwest::Client::new(),
        }
    }

    /// Override the API base URL (for tests against a local stub).
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.api_base_url = url.into();
        self
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.api_base_url, path)
    }

    async fn get(&self, path: &str) -> Result<reqwest::Response, GatewayError> {
        self.http_client
            .get(self.url(path))
            .basic_auth(self.api_key.expose_secret(), Option::<&str>::None)
            .send()
            .await
            .map_err(|e| GatewayError::network(e.to_string()))
    }

    async fn post_form(
        &self,
        path: &str,
        params: &[(String, String)],
    ) -> Result<reqwest::Response, GatewayError> {
        self.http_client
            .post(self.url(path))
            .basic_auth(self.api_key.expose_secret(), Option::<&str>::None)
            .form(params)
            .send()
            .await
            .map_err(|e| GatewayError::network(e.to_string()))
    }

    async fn delete(&self, path: &str) -> Result<reqwest::Response, GatewayError> {
        self.http_client
            .delete(self.url(path))
            .basic_auth(self.api_key.expose_secret(), Option::<&str>::None)
            .send()
            .await
            .map_err(|e| GatewayError::network(e.to_string()))
    }

    /// Turns a non-success response into a categorized gateway error.
    async fn error_from_response(response: reqwest::Response) -> GatewayError {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();

        let detail = serde_json::from_str::<StripeErrorBody>(&body)
            .ok()
            .map(|b| b.error);

        let message = detail
            .as_ref()
            .and_then(|d| d.message.clone())
            .unwrap_or_else(|| format!("Stripe API error (HTTP {})", status.as_u16()));

        let code = match (status.as_u16(), detail.as_ref().and_then(|d| d.kind.as_deref())) {
            (_, Some("card_error")) => GatewayErrorCode::CardDeclined,
            (_, Some("invalid_request_error")) => GatewayErrorCode::InvalidRequest,
            (401, _) => GatewayErrorCode::AuthenticationError,
            (404, _) => GatewayErrorCode::NotFound,
            (429, _) => GatewayErrorCode::RateLimitExceeded,
            _ => GatewayErrorCode::ApiError,
        };

        tracing::warn!(status = status.as_u16(), %message, "Stripe API call failed");
        GatewayError::new(code, message)
    }

    async fn parse<T: serde::de::DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<T, GatewayError> {
        if !response.status().is_success() {
            return Err(Self::error_from_response(response).await);
        }
        response
            .json()
            .await
            .map_err(|e| GatewayError::api(format!("Failed to parse Stripe response: {}", e)))
    }
}

#[async_trait]
impl PaymentGateway for StripeGateway {
    async fn create_customer(
        &self,
        request: CreateCustomerRequest,
    ) -> Result<GatewayCustomer, GatewayError> {
        let mut params = vec![
            ("email".to_string(), request.email),
            ("description".to_string(), request.description),
        ];
        if let Some(token) = request.card_token {
            params.push(("card".to_string(), token));
        }
        if let Some(plan) = request.plan {
            params.push(("plan".to_string(), plan));
        }
        if let Some(quantity) = request.quantity {
            params.push(("quantity".to_string(), quantity.to_string()));
        }
        for (key, value) in request.metadata {
            params.push((format!("metadata[{}]", key), value));
        }

        let response = self.post_form("/v1/customers", &params).await?;
        let customer: StripeCustomer = Self::parse(response).await?;
        Ok(customer.into_gateway())
    }

    async fn retrieve_customer(
        &self,
        customer_id: &str,
    ) -> Result<Option<GatewayCustomer>, GatewayError> {
        let response = self.get(&format!("/v1/customers/{}", customer_id)).await?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }

        let customer: StripeCustomer = Self::parse(response).await?;
        if customer.deleted {
            return Ok(None);
        }
        Ok(Some(customer.into_gateway()))
    }

    async fn update_card(
        &self,
        customer_id: &str,
        card_token: &str,
    ) -> Result<GatewayCard, GatewayError> {
        let params = vec![("card".to_string(), card_token.to_string())];
        let response = self
            .post_form(&format!("/v1/customers/{}", customer_id), &params)
            .await?;

        let customer: StripeCustomer = Self::parse(response).await?;
        customer
            .active_card
            .map(|c| c.into_gateway())
            .ok_or_else(|| GatewayError::api("Customer update returned no active card"))
    }

    async fn create_subscription(
        &self,
        request: CreateSubscriptionRequest,
    ) -> Result<GatewaySubscription, GatewayError> {
        let params = vec![
            ("plan".to_string(), request.plan_id),
            ("quantity".to_string(), request.quantity.to_string()),
        ];
        let response = self
            .post_form(
                &format!("/v1/customers/{}/subscription", request.customer_id),
                &params,
            )
            .await?;

        let subscription: StripeSubscription = Self::parse(response).await?;
        Ok(subscription.into_gateway_for_customer(&request.customer_id))
    }

    async fn cancel_subscription(
        &self,
        customer_id: &str,
        at_period_end: bool,
    ) -> Result<GatewaySubscription, GatewayError> {
        let path = format!(
            "/v1/customers/{}/subscription?at_period_end={}",
            customer_id, at_period_end
        );
        let response = self.delete(&path).await?;

        let subscription: StripeSubscription = Self::parse(response).await?;
        Ok(subscription.into_gateway_for_customer(customer_id))
    }

    async fn create_invoice_item(
        &self,
        request: CreateInvoiceItemRequest,
    ) -> Result<String, GatewayError> {
        let mut params = vec![
            ("customer".to_string(), request.customer_id),
            ("amount".to_string(), request.amount_cents.to_string()),
            ("currency".to_string(), request.currency),
            ("description".to_string(), request.description),
        ];
        for (key, value) in request.metadata {
            params.push((format!("metadata[{}]", key), value));
        }

        let response = self.post_form("/v1/invoiceitems", &params).await?;

        #[derive(serde::Deserialize)]
        struct InvoiceItemResponse {
            id: String,
        }

        let item: InvoiceItemResponse = Self::parse(response).await?;
        Ok(item.id)
    }

    async fn create_invoice(
        &self,
        customer_id: &str,
        description: &str,
    ) -> Result<GatewayInvoice, GatewayError> {
        let params = vec![
            ("customer".to_string(), customer_id.to_string()),
            ("description".to_string(), description.to_string()),
        ];
        let response = self.post_form("/v1/invoices", &params).await?;

        let invoice: StripeInvoice = Self::parse(response).await?;
        Ok(invoice.into_gateway())
    }

    async fn pay_invoice(&self, invoice_id: &str) -> Result<GatewayInvoice, GatewayError> {
        let response = self
            .post_form(&format!("/v1/invoices/{}/pay", invoice_id), &[])
            .await?;

        let invoice: StripeInvoice = Self::parse(response).await?;
        Ok(invoice.into_gateway())
    }

    async fn list_invoices(&self, customer_id: &str) -> Result<Vec<GatewayInvoice>, GatewayError> {
        let response = self
            .get(&format!("/v1/invoices?customer={}&limit=100", customer_id))
            .await?;

        let list: StripeList<StripeInvoice> = Self::parse(response).await?;
        Ok(list.data.into_iter().map(StripeInvoice::into_gateway).collect())
    }

    async fn retrieve_event(&self, event_id: &str) -> Result<Option<GatewayEvent>, GatewayError> {
        let response = self.get(&format!("/v1/events/{}", event_id)).await?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }

        let event: StripeEventEnvelope = Self::parse(response).await?;
        Ok(Some(event.into_gateway()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config() -> PaymentConfig {
        serde_json::from_value(serde_json::json!({
            "secret_key": "sk_test_key",
            "webhook_secret": "whsec_test_secret"
        }))
        .unwrap()
    }

    #[test]
    fn gateway_uses_configured_base_url() {
        let gateway = StripeGateway::new(&test_config());
        assert_eq!(gateway.url("/v1/customers"), "https://api.stripe.com/v1/customers");
    }

    #[test]
    fn with_base_url_overrides() {
        let gateway = StripeGateway::new(&test_config()).with_base_url("http://localhost:12111");
        assert_eq!(
            gateway.url("/v1/events/evt_1"),
            "http://localhost:12111/v1/events/evt_1"
        );
    }
}
