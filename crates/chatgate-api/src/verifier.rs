use std::time::Duration;

use axum::http::{HeaderMap, StatusCode, header};
use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, warn};

/// Upper bound for one round-trip to the identity service.
pub const VERIFY_TIMEOUT: Duration = Duration::from_secs(3);

const VERIFY_PATH: &str = "/api/v1/auth/verify";

#[derive(Debug, Error)]
pub enum AuthFailure {
    #[error("Bearer token required")]
    MissingToken,

    #[error("Invalid or expired token (identity service returned {0})")]
    InvalidOrExpired(StatusCode),

    #[error("Auth service unavailable: {0}")]
    ServiceUnavailable(#[source] reqwest::Error),

    #[error("Auth service returned an unusable response: {0}")]
    MalformedResponse(String),
}

#[derive(Debug, Deserialize)]
struct VerifyResponse {
    #[serde(rename = "userId")]
    user_id: Option<Value>,
}

/// Checks bearer tokens against the external identity service.
#[derive(Debug, Clone)]
pub struct TokenVerifier {
    client: reqwest::Client,
    verify_url: String,
}

impl TokenVerifier {
    pub fn new(identity_base_url: &str) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder().timeout(VERIFY_TIMEOUT).build()?;
        Ok(Self {
            client,
            verify_url: format!("{}{}", identity_base_url.trim_end_matches('/'), VERIFY_PATH),
        })
    }

    /// Resolve `token` to the user id it was issued for. Single attempt,
    /// nothing cached.
    pub async fn verify(&self, token: &str) -> Result<String, AuthFailure> {
        let resp = self
            .client
            .post(&self.verify_url)
            .bearer_auth(token)
            .send()
            .await
            .map_err(|e| {
                warn!("Identity service unreachable: {}", e);
                AuthFailure::ServiceUnavailable(e)
            })?;

        let status = resp.status();
        if status != StatusCode::OK && status != StatusCode::CREATED {
            debug!("Identity service rejected token with {}", status);
            return Err(AuthFailure::InvalidOrExpired(status));
        }

        let body = resp.bytes().await.map_err(AuthFailure::ServiceUnavailable)?;
        let parsed: VerifyResponse = serde_json::from_slice(&body)
            .map_err(|e| AuthFailure::MalformedResponse(e.to_string()))?;

        let user_id = match parsed.user_id {
            Some(Value::String(s)) => s,
            Some(Value::Number(n)) => n.to_string(),
            Some(other) => {
                return Err(AuthFailure::MalformedResponse(format!(
                    "userId has unexpected type: {}",
                    other
                )));
            }
            None => return Err(AuthFailure::MalformedResponse("missing userId".into())),
        };

        if user_id.is_empty() {
            return Err(AuthFailure::MalformedResponse("empty userId".into()));
        }

        Ok(user_id)
    }
}

/// Pull the raw token out of `Authorization: Bearer <token>`.
///
/// Returns `None` for a missing header, another scheme, or a token that is
/// empty or contains whitespace (including extra spaces after `Bearer`).
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    let token = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())?
        .strip_prefix("Bearer ")?;

    if token.is_empty() || token.contains(char::is_whitespace) {
        return None;
    }
    Some(token)
}
