//! GigaChat client against a local stand-in for the OAuth and completion APIs.

use std::collections::HashMap;

use axum::{
    Form, Json, Router,
    http::{HeaderMap, StatusCode, header},
    response::{IntoResponse, Response},
    routing::post,
};
use serde_json::{Value, json};
use tokio::net::TcpListener;

use chatgate_api::provider::{ChatProvider, GigaChatConfig, GigaChatProvider, ProviderError};

const CREDENTIALS: &str = "dGVzdC1jbGllbnQ6dGVzdC1zZWNyZXQ=";
const ACCESS_TOKEN: &str = "tok-123";

async fn mock_oauth(headers: HeaderMap, Form(form): Form<HashMap<String, String>>) -> Response {
    let authorized = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        == Some(format!("Basic {}", CREDENTIALS).as_str());
    let has_rquid = headers.get("rquid").is_some();
    let scope_ok = form.get("scope").map(String::as_str) == Some("GIGACHAT_API_PERS");

    if !(authorized && has_rquid && scope_ok) {
        return (StatusCode::UNAUTHORIZED, "bad oauth request").into_response();
    }
    Json(json!({ "access_token": ACCESS_TOKEN, "expires_at": 1_706_026_848_841u64 })).into_response()
}

async fn mock_completions(headers: HeaderMap, Json(body): Json<Value>) -> Response {
    let bearer = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        == Some(format!("Bearer {}", ACCESS_TOKEN).as_str());
    if !bearer || body["model"] != "GigaChat" {
        return (StatusCode::UNAUTHORIZED, "bad completion request").into_response();
    }

    let messages = body["messages"].as_array().cloned().unwrap_or_default();
    if messages.len() != 1 || messages[0]["role"] != "user" {
        return (StatusCode::BAD_REQUEST, "expected exactly one user message").into_response();
    }

    match messages[0]["content"].as_str().unwrap_or_default() {
        "fail" => (StatusCode::INTERNAL_SERVER_ERROR, "boom").into_response(),
        "empty" => Json(json!({ "choices": [] })).into_response(),
        "blank" => Json(json!({
            "choices": [{ "message": { "role": "assistant", "content": "" }, "index": 0 }]
        }))
        .into_response(),
        "null" => Json(json!({
            "choices": [{ "message": { "role": "assistant", "content": null }, "index": 0 }]
        }))
        .into_response(),
        content => Json(json!({
            "choices": [{
                "message": { "role": "assistant", "content": format!("reply to {}", content) },
                "index": 0,
                "finish_reason": "stop"
            }],
            "model": "GigaChat:1.0"
        }))
        .into_response(),
    }
}

async fn provider() -> GigaChatProvider {
    let app = Router::new()
        .route("/api/v2/oauth", post(mock_oauth))
        .route("/api/v1/chat/completions", post(mock_completions));

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    let mut config = GigaChatConfig::new(CREDENTIALS);
    config.base_url = format!("http://{}/api/v1/", addr);
    config.auth_url = format!("http://{}/api/v2/oauth", addr);
    GigaChatProvider::new(config).unwrap()
}

#[tokio::test]
async fn completes_single_message() {
    let provider = provider().await;
    let reply = provider.complete("hello").await.unwrap();
    assert_eq!(reply, "reply to hello");
}

#[tokio::test]
async fn non_success_status_is_reported_with_body() {
    let provider = provider().await;
    match provider.complete("fail").await {
        Err(ProviderError::Status { status, body }) => {
            assert_eq!(status, 500);
            assert_eq!(body, "boom");
        }
        other => panic!("expected status error, got {:?}", other),
    }
}

#[tokio::test]
async fn empty_choices_are_malformed() {
    let provider = provider().await;
    let err = provider.complete("empty").await.unwrap_err();
    assert!(matches!(err, ProviderError::Malformed(_)));
}

#[tokio::test]
async fn blank_or_missing_content_is_malformed() {
    let provider = provider().await;
    for message in ["blank", "null"] {
        let err = provider.complete(message).await.unwrap_err();
        assert!(matches!(err, ProviderError::Malformed(_)), "{}: {:?}", message, err);
    }
}

#[tokio::test]
async fn rejected_credentials_surface_as_status_error() {
    let app = Router::new().route("/api/v2/oauth", post(mock_oauth));
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    let mut config = GigaChatConfig::new("wrong-key");
    config.base_url = format!("http://{}/api/v1", addr);
    config.auth_url = format!("http://{}/api/v2/oauth", addr);
    let provider = GigaChatProvider::new(config).unwrap();

    let err = provider.complete("hello").await.unwrap_err();
    assert!(matches!(err, ProviderError::Status { status: 401, .. }));
}
