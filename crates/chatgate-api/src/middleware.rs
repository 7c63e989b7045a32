use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};

use crate::error::ApiError;
use crate::state::AppState;
use crate::verifier::{AuthFailure, bearer_token};

/// Identity resolved by the identity service for the current request.
#[derive(Debug, Clone)]
pub struct VerifiedIdentity {
    pub user_id: String,
}

/// Verify the bearer token and make the caller's identity available to the
/// handler. Rejected requests never reach the handler.
pub async fn require_auth(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = bearer_token(req.headers()).ok_or(AuthFailure::MissingToken)?;

    let user_id = state.verifier.verify(token).await?;

    req.extensions_mut().insert(VerifiedIdentity { user_id });
    Ok(next.run(req).await)
}
