use async_trait::async_trait;
use reqwest::header::ACCEPT;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;
use uuid::Uuid;

pub const DEFAULT_BASE_URL: &str = "https://gigachat.devices.sberbank.ru/api/v1";
pub const DEFAULT_AUTH_URL: &str = "https://ngw.devices.sberbank.ru:9443/api/v2/oauth";
pub const DEFAULT_SCOPE: &str = "GIGACHAT_API_PERS";
pub const DEFAULT_MODEL: &str = "GigaChat";

#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("AI provider request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("AI provider returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Malformed AI provider response: {0}")]
    Malformed(String),
}

/// A conversational backend that answers one message at a time.
///
/// Calls are independent: no earlier turns are sent along.
#[async_trait]
pub trait ChatProvider: Send + Sync {
    async fn complete(&self, message: &str) -> Result<String, ProviderError>;
}

#[derive(Debug, Clone)]
pub struct GigaChatConfig {
    /// Authorization key issued by the provider, sent as Basic credentials.
    pub credentials: String,
    pub scope: String,
    pub model: String,
    pub base_url: String,
    pub auth_url: String,
    pub verify_ssl_certs: bool,
}

impl GigaChatConfig {
    pub fn new(credentials: impl Into<String>) -> Self {
        Self {
            credentials: credentials.into(),
            scope: DEFAULT_SCOPE.into(),
            model: DEFAULT_MODEL.into(),
            base_url: DEFAULT_BASE_URL.into(),
            auth_url: DEFAULT_AUTH_URL.into(),
            verify_ssl_certs: false,
        }
    }
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
}

#[derive(Debug, Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    messages: [CompletionMessage<'a>; 1],
}

#[derive(Debug, Serialize)]
struct CompletionMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct CompletionResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

/// GigaChat over its REST API: an OAuth exchange for an access token, then a
/// single-message chat completion.
pub struct GigaChatProvider {
    client: reqwest::Client,
    config: GigaChatConfig,
}

impl GigaChatProvider {
    pub fn new(config: GigaChatConfig) -> Result<Self, ProviderError> {
        // No request timeout: a stalled completion holds the request open.
        let client = reqwest::Client::builder()
            .danger_accept_invalid_certs(!config.verify_ssl_certs)
            .build()?;
        Ok(Self { client, config })
    }

    async fn access_token(&self) -> Result<String, ProviderError> {
        let resp = self
            .client
            .post(&self.config.auth_url)
            .header(reqwest::header::AUTHORIZATION, format!("Basic {}", self.config.credentials))
            .header("RqUID", Uuid::new_v4().to_string())
            .header(ACCEPT, "application/json")
            .form(&[("scope", self.config.scope.as_str())])
            .send()
            .await?;

        let resp = check_status(resp).await?;
        let token: TokenResponse = resp
            .json()
            .await
            .map_err(|e| ProviderError::Malformed(format!("token response: {}", e)))?;
        Ok(token.access_token)
    }
}

#[async_trait]
impl ChatProvider for GigaChatProvider {
    async fn complete(&self, message: &str) -> Result<String, ProviderError> {
        let token = self.access_token().await?;

        let url = format!("{}/chat/completions", self.config.base_url.trim_end_matches('/'));
        let body = CompletionRequest {
            model: &self.config.model,
            messages: [CompletionMessage {
                role: "user",
                content: message,
            }],
        };

        let resp = self
            .client
            .post(&url)
            .bearer_auth(token)
            .header(ACCEPT, "application/json")
            .json(&body)
            .send()
            .await?;

        let resp = check_status(resp).await?;
        let completion: CompletionResponse = resp
            .json()
            .await
            .map_err(|e| ProviderError::Malformed(format!("completion response: {}", e)))?;

        let reply = completion
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| ProviderError::Malformed("no choices returned".into()))?
            .message
            .content
            .filter(|content| !content.is_empty())
            .ok_or_else(|| ProviderError::Malformed("choice has no content".into()))?;

        debug!("GigaChat replied with {} bytes", reply.len());
        Ok(reply)
    }
}

async fn check_status(resp: reqwest::Response) -> Result<reqwest::Response, ProviderError> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    let body = resp.text().await.unwrap_or_default();
    Err(ProviderError::Status {
        status: status.as_u16(),
        body,
    })
}
