use anyhow::Result;
use chatgate_types::models::Role;
use rusqlite::Connection;

use crate::Database;
use crate::models::TurnRow;

impl Database {
    // -- Turns --

    /// Store one exchange: the user's turn followed by the assistant's reply.
    /// Both rows commit together or not at all.
    pub fn insert_exchange(
        &self,
        user_id: &str,
        user_message: &str,
        assistant_message: &str,
    ) -> Result<()> {
        self.with_conn(|conn| {
            let tx = conn.transaction()?;
            tx.execute(
                "INSERT INTO ai_messages (user_id, role, content)
                 VALUES (?1, ?2, ?3), (?1, ?4, ?5)",
                rusqlite::params![
                    user_id,
                    Role::User.as_str(),
                    user_message,
                    Role::Assistant.as_str(),
                    assistant_message,
                ],
            )?;
            tx.commit()?;
            Ok(())
        })
    }

    /// All turns for `user_id`, oldest first. Empty when the user has no history.
    pub fn list_turns(&self, user_id: &str) -> Result<Vec<TurnRow>> {
        self.with_conn(|conn| query_turns(conn, user_id))
    }
}

fn query_turns(conn: &Connection, user_id: &str) -> Result<Vec<TurnRow>> {
    // id breaks ties so a pair inserted in the same millisecond keeps user-then-assistant order
    let mut stmt = conn.prepare(
        "SELECT id, user_id, role, content, created_at
         FROM ai_messages
         WHERE user_id = ?1
         ORDER BY created_at ASC, id ASC",
    )?;

    let rows = stmt
        .query_map([user_id], |row| {
            Ok(TurnRow {
                id: row.get(0)?,
                user_id: row.get(1)?,
                role: row.get(2)?,
                content: row.get(3)?,
                created_at: row.get(4)?,
            })
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn open_temp() -> (TempDir, Database) {
        let dir = tempfile::tempdir().unwrap();
        let db = Database::open(&dir.path().join("chat.db")).unwrap();
        (dir, db)
    }

    #[test]
    fn empty_history_is_not_an_error() {
        let (_dir, db) = open_temp();
        assert!(db.list_turns("nobody").unwrap().is_empty());
    }

    #[test]
    fn exchange_is_stored_as_ordered_pair() {
        let (_dir, db) = open_temp();
        db.insert_exchange("u1", "hello", "hi there").unwrap();
        db.insert_exchange("u1", "how are you?", "fine").unwrap();

        let turns = db.list_turns("u1").unwrap();
        let flat: Vec<(&str, &str)> = turns
            .iter()
            .map(|t| (t.role.as_str(), t.content.as_str()))
            .collect();
        assert_eq!(
            flat,
            vec![
                ("user", "hello"),
                ("assistant", "hi there"),
                ("user", "how are you?"),
                ("assistant", "fine"),
            ]
        );
        assert!(turns.windows(2).all(|w| w[0].id < w[1].id));
        assert!(turns.iter().all(|t| t.user_id == "u1"));
    }

    #[test]
    fn history_is_scoped_to_user() {
        let (_dir, db) = open_temp();
        db.insert_exchange("alice", "a", "ra").unwrap();
        db.insert_exchange("bob", "b", "rb").unwrap();

        let alice = db.list_turns("alice").unwrap();
        assert_eq!(alice.len(), 2);
        assert!(alice.iter().all(|t| t.user_id == "alice"));
        assert_eq!(db.list_turns("bob").unwrap().len(), 2);
    }

    #[test]
    fn failed_exchange_leaves_no_partial_rows() {
        let (_dir, db) = open_temp();
        // Empty user_id violates the CHECK constraint, so the whole statement fails
        assert!(db.insert_exchange("", "hello", "reply").is_err());

        let total: i64 = db
            .with_conn(|conn| {
                Ok(conn.query_row("SELECT COUNT(*) FROM ai_messages", [], |row| row.get(0))?)
            })
            .unwrap();
        assert_eq!(total, 0);
    }

    #[test]
    fn reopening_preserves_schema_and_rows() {
        let (dir, db) = open_temp();
        db.insert_exchange("u1", "q", "a").unwrap();

        let reopened = Database::open(&dir.path().join("chat.db")).unwrap();
        assert_eq!(reopened.list_turns("u1").unwrap().len(), 2);
    }

    #[test]
    fn created_at_is_rfc3339_utc() {
        let (_dir, db) = open_temp();
        db.insert_exchange("u1", "q", "a").unwrap();

        let turns = db.list_turns("u1").unwrap();
        assert!(turns[0].created_at.ends_with('Z'));
        assert!(turns[0].created_at.contains('T'));
    }

    #[test]
    fn missing_store_location_surfaces_error() {
        let dir = tempfile::tempdir().unwrap();
        let result = Database::open(&dir.path().join("missing").join("chat.db"));
        assert!(result.is_err());
    }
}
