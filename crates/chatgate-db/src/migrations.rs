use anyhow::Result;
use rusqlite::Connection;
use tracing::info;

/// Create the turn table if absent. Safe to run on every startup.
pub fn run(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS ai_messages (
            id          INTEGER PRIMARY KEY AUTOINCREMENT,
            user_id     TEXT NOT NULL CHECK (length(user_id) > 0),
            role        TEXT NOT NULL CHECK (role IN ('user', 'assistant')),
            content     TEXT NOT NULL,
            created_at  TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%fZ', 'now'))
        );

        CREATE INDEX IF NOT EXISTS idx_ai_messages_user
            ON ai_messages(user_id, created_at);
        ",
    )?;

    info!("Database migrations complete");
    Ok(())
}
