//! Bearer-token authentication.
//!
//! Named capability: handlers that take an [`AuthenticatedUser`] argument
//! require a valid bearer token; everything else is anonymous. Tokens are
//! HS256-signed with the shared secret from [`crate::config::AuthConfig`].

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use secrecy::ExposeSecret;
use serde::{Deserialize, Serialize};

use crate::config::AuthConfig;
use crate::domain::foundation::UserId;

use super::super::error::ErrorResponse;
use super::super::AppState;

/// Claims carried in session tokens.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject: the user id.
    pub sub: String,

    /// User email, used for lazy processor customer creation.
    #[serde(default)]
    pub email: String,

    /// Username, for display.
    #[serde(default)]
    pub username: String,

    /// Token issuer.
    pub iss: String,

    /// Expiry (Unix seconds).
    pub exp: i64,
}

/// Authenticated user context extracted from the Authorization header.
#[derive(Debug, Clone)]
pub struct AuthenticatedUser {
    pub user_id: UserId,
    pub email: String,
    pub username: String,
}

/// Rejection type for AuthenticatedUser extraction.
pub struct AuthenticationRequired;

impl IntoResponse for AuthenticationRequired {
    fn into_response(self) -> axum::response::Response {
        let error = ErrorResponse::new("AUTHENTICATION_REQUIRED", "Authentication is required");
        (StatusCode::UNAUTHORIZED, Json(error)).into_response()
    }
}

impl FromRequestParts<AppState> for AuthenticatedUser {
    type Rejection = AuthenticationRequired;

    fn from_request_parts<'life0, 'life1, 'async_trait>(
        parts: &'life0 mut Parts,
        state: &'life1 AppState,
    ) -> std::pin::Pin<
        Box<dyn std::future::Future<Output = Result<Self, Self::Rejection>> + Send + 'async_trait>,
    >
    where
        'life0: 'async_trait,
        'life1: 'async_trait,
        Self: 'async_trait,
    {
        Box::pin(async move {
            let token = parts
                .headers
                .get(axum::http::header::AUTHORIZATION)
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.strip_prefix("Bearer "))
                .ok_or(AuthenticationRequired)?;

            let claims = decode_token(token, &state.auth).map_err(|err| {
                tracing::debug!(error = %err, "Rejected bearer token");
                AuthenticationRequired
            })?;

            let user_id = UserId::new(claims.sub).map_err(|_| AuthenticationRequired)?;

            Ok(AuthenticatedUser {
                user_id,
                email: claims.email,
                username: claims.username,
            })
        })
    }
}

/// Decodes and validates a session token.
pub fn decode_token(token: &str, config: &AuthConfig) -> Result<Claims, jsonwebtoken::errors::Error> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.set_issuer(&[&config.issuer]);

    let data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(config.token_secret.expose_secret().as_bytes()),
        &validation,
    )?;
    Ok(data.claims)
}

/// Issues a session token. Used by tests and operational tooling; token
/// issuance normally belongs to the auth provider.
pub fn issue_token(
    config: &AuthConfig,
    user_id: &str,
    email: &str,
    username: &str,
) -> Result<String, jsonwebtoken::errors::Error> {
    let claims = Claims {
        sub: user_id.to_string(),
        email: email.to_string(),
        username: username.to_string(),
        iss: config.issuer.clone(),
        exp: chrono::Utc::now().timestamp() + 3600,
    };
    encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(config.token_secret.expose_secret().as_bytes()),
    )
}
