use axum::{Extension, Json, extract::State};
use chrono::{DateTime, NaiveDateTime, Utc};
use tracing::{error, warn};

use chatgate_db::models::TurnRow;
use chatgate_types::api::{HistoryEntry, HistoryResponse};
use chatgate_types::models::Role;

use crate::error::ApiError;
use crate::middleware::VerifiedIdentity;
use crate::state::AppState;

/// GET /ai/history — every stored turn of the verified user, oldest first.
pub async fn get_history(
    State(state): State<AppState>,
    Extension(identity): Extension<VerifiedIdentity>,
) -> Result<Json<HistoryResponse>, ApiError> {
    let db = state.clone();
    let uid = identity.user_id.clone();
    let rows = tokio::task::spawn_blocking(move || db.db.list_turns(&uid))
        .await
        .map_err(|e| {
            error!("spawn_blocking join error: {}", e);
            ApiError::Storage(e.into())
        })?
        .map_err(ApiError::Storage)?;

    let messages = rows.into_iter().filter_map(to_entry).collect();

    Ok(Json(HistoryResponse { messages }))
}

fn to_entry(row: TurnRow) -> Option<HistoryEntry> {
    let role = match row.role.parse::<Role>() {
        Ok(role) => role,
        Err(e) => {
            warn!("Skipping turn {}: {}", row.id, e);
            return None;
        }
    };

    Some(HistoryEntry {
        role,
        content: row.content,
        timestamp: parse_timestamp(&row.created_at).unwrap_or_else(|| {
            warn!("Corrupt created_at '{}' on turn {}", row.created_at, row.id);
            DateTime::default()
        }),
    })
}

fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    raw.parse::<DateTime<Utc>>()
        .or_else(|_| {
            // Rows written with SQLite's datetime('now') have no zone or 'T'
            NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S%.f").map(|ndt| ndt.and_utc())
        })
        .ok()
}
