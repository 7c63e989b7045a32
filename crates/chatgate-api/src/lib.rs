pub mod chat;
pub mod error;
pub mod history;
pub mod middleware;
pub mod provider;
pub mod state;
pub mod verifier;

use axum::{
    Json, Router,
    routing::{get, post},
};

use chatgate_types::api::HealthResponse;

use crate::middleware::require_auth;
use crate::state::AppState;

/// Build the gateway routes. `/ai/*` sits behind bearer verification,
/// `/health` does not.
pub fn router(state: AppState) -> Router {
    let protected_routes = Router::new()
        .route("/ai/chat", post(chat::send_chat))
        .route("/ai/history", get(history::get_history))
        .route_layer(axum::middleware::from_fn_with_state(
            state.clone(),
            require_auth,
        ));

    Router::new()
        .route("/health", get(health))
        .merge(protected_routes)
        .with_state(state)
}

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".into(),
    })
}
