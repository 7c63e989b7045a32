//! Row types for the `ai_messages` table. Kept as plain text columns so the
//! store stays independent of the wire types.

pub struct TurnRow {
    pub id: i64,
    pub user_id: String,
    pub role: String,
    pub content: String,
    pub created_at: String,
}
