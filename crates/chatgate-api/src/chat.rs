use axum::{
    Extension, Json,
    extract::{State, rejection::JsonRejection},
};
use tracing::{error, info};

use chatgate_types::api::{ChatRequest, ChatResponse};

use crate::error::ApiError;
use crate::middleware::VerifiedIdentity;
use crate::state::AppState;

/// POST /ai/chat — forward one message to the AI provider and store the
/// exchange for the verified user.
pub async fn send_chat(
    State(state): State<AppState>,
    Extension(identity): Extension<VerifiedIdentity>,
    body: Result<Json<ChatRequest>, JsonRejection>,
) -> Result<Json<ChatResponse>, ApiError> {
    let Json(req) = body.map_err(|e| ApiError::InvalidBody(e.body_text()))?;

    let message = req.message.trim();
    if message.is_empty() {
        return Err(ApiError::EmptyMessage);
    }

    let reply = state.provider.complete(message).await?;

    // Run blocking DB insert off the async runtime
    let db = state.clone();
    let uid = identity.user_id.clone();
    let user_message = message.to_string();
    let assistant_message = reply.clone();
    tokio::task::spawn_blocking(move || {
        db.db.insert_exchange(&uid, &user_message, &assistant_message)
    })
    .await
    .map_err(|e| {
        error!("spawn_blocking join error: {}", e);
        ApiError::Storage(e.into())
    })?
    .map_err(ApiError::Storage)?;

    info!(
        "Stored exchange for user {} ({} -> {} bytes)",
        identity.user_id,
        message.len(),
        reply.len()
    );

    Ok(Json(ChatResponse {
        reply,
        user_id: identity.user_id,
    }))
}
