use std::collections::HashMap;
use std::net::SocketAddr;
use std::path::PathBuf;

use anyhow::{Context, Result, anyhow};

use chatgate_api::provider::GigaChatConfig;

/// Server-database settings with no meaning for an embedded SQLite file.
const SERVER_DB_VARS: [&str; 4] = ["DB_HOST", "DB_PORT", "DB_USERNAME", "DB_PASSWORD"];

/// Process configuration, read once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    pub bind_addr: SocketAddr,
    pub identity_url: String,
    /// Shared with the identity service; not used to verify tokens locally.
    pub jwt_secret: Option<String>,
    pub gigachat: GigaChatConfig,
    pub db_path: PathBuf,
    /// Entries of `SERVER_DB_VARS` that were set anyway.
    pub ignored_db_vars: Vec<&'static str>,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_vars(&std::env::vars().collect())
    }

    pub fn from_vars(vars: &HashMap<String, String>) -> Result<Self> {
        let get = |key: &str| vars.get(key).map(|v| v.trim()).filter(|v| !v.is_empty());
        let required = |key: &str| get(key).ok_or_else(|| anyhow!("{} must be set", key));

        let host = get("CHATGATE_HOST").unwrap_or("0.0.0.0");
        let port: u16 = get("CHATGATE_PORT")
            .unwrap_or("5000")
            .parse()
            .context("CHATGATE_PORT is not a valid port")?;
        let bind_addr: SocketAddr = format!("{}:{}", host, port)
            .parse()
            .with_context(|| format!("invalid bind address {}:{}", host, port))?;

        let identity_url = required("NESTJS_BACKEND_URL")?
            .trim_end_matches('/')
            .to_string();

        let mut gigachat = GigaChatConfig::new(required("GIGACHAT_API_KEY")?);
        if let Some(scope) = get("GIGACHAT_SCOPE") {
            gigachat.scope = scope.to_string();
        }
        if let Some(model) = get("GIGACHAT_MODEL") {
            gigachat.model = model.to_string();
        }
        if let Some(url) = get("GIGACHAT_BASE_URL") {
            gigachat.base_url = url.trim_end_matches('/').to_string();
        }
        if let Some(url) = get("GIGACHAT_AUTH_URL") {
            gigachat.auth_url = url.to_string();
        }
        if let Some(flag) = get("GIGACHAT_VERIFY_SSL_CERTS") {
            gigachat.verify_ssl_certs = parse_bool(flag)
                .ok_or_else(|| anyhow!("GIGACHAT_VERIFY_SSL_CERTS must be true or false"))?;
        }

        let db_path = match get("DB_PATH") {
            Some(path) => PathBuf::from(path),
            None => PathBuf::from(format!("{}.db", get("DB_NAME").unwrap_or("ai_chat"))),
        };

        Ok(Self {
            bind_addr,
            identity_url,
            jwt_secret: get("JWT_SECRET_KEY").map(str::to_string),
            gigachat,
            db_path,
            ignored_db_vars: SERVER_DB_VARS
                .into_iter()
                .filter(|key| get(*key).is_some())
                .collect(),
        })
    }
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
