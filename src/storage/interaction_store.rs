use rusqlite::{Connection, params};

use crate::types::{DayWindow, InteractionKind, Result, enum_to_str};

/// Interaction ledger: like/bookmark toggles and view/share events
pub struct InteractionStore<'c> {
    conn: &'c Connection,
}

impl<'c> InteractionStore<'c> {
    pub fn new(conn: &'c Connection) -> Self {
        Self { conn }
    }

    /// Whether a toggle row exists for this user and prompt
    pub fn exists(&self, user_id: &str, prompt_id: &str, kind: InteractionKind) -> Result<bool> {
        let exists: bool = self.conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM interactions WHERE user_id = ?1 AND prompt_id = ?2 AND kind = ?3)",
            params![user_id, prompt_id, enum_to_str(&kind)],
            |row| row.get(0),
        )?;
        Ok(exists)
    }

    /// Insert a toggle row; returns false if it already existed
    pub fn insert_toggle(
        &self,
        user_id: &str,
        prompt_id: &str,
        kind: InteractionKind,
        at: i64,
    ) -> Result<bool> {
        debug_assert!(kind.is_toggle());
        let inserted = self.conn.execute(
            "INSERT OR IGNORE INTO interactions (user_id, prompt_id, kind, created_at) VALUES (?1, ?2, ?3, ?4)",
            params![user_id, prompt_id, enum_to_str(&kind), at],
        )?;
        Ok(inserted > 0)
    }

    /// Remove a toggle row; returns false if there was none
    pub fn delete_toggle(&self, user_id: &str, prompt_id: &str, kind: InteractionKind) -> Result<bool> {
        let deleted = self.conn.execute(
            "DELETE FROM interactions WHERE user_id = ?1 AND prompt_id = ?2 AND kind = ?3",
            params![user_id, prompt_id, enum_to_str(&kind)],
        )?;
        Ok(deleted > 0)
    }

    /// Append a view event and its quota entry, returning the event row id
    pub fn record_view(&self, user_id: &str, prompt_id: &str, own_prompt: bool, at: i64) -> Result<i64> {
        let id = self.record_event(Some(user_id), prompt_id, InteractionKind::View, at)?;
        self.conn.execute(
            "INSERT INTO view_log (user_id, own_prompt, created_at) VALUES (?1, ?2, ?3)",
            params![user_id, own_prompt, at],
        )?;
        Ok(id)
    }

    /// Append a view or share event, returning its row id
    pub fn record_event(
        &self,
        user_id: Option<&str>,
        prompt_id: &str,
        kind: InteractionKind,
        at: i64,
    ) -> Result<i64> {
        debug_assert!(!kind.is_toggle());
        self.conn.execute(
            "INSERT INTO interactions (user_id, prompt_id, kind, created_at) VALUES (?1, ?2, ?3, ?4)",
            params![user_id, prompt_id, enum_to_str(&kind), at],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    #[cfg(test)]
    pub fn count_for_prompt(&self, prompt_id: &str, kind: InteractionKind) -> Result<u64> {
        let n: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM interactions WHERE prompt_id = ?1 AND kind = ?2",
            params![prompt_id, enum_to_str(&kind)],
            |row| row.get(0),
        )?;
        Ok(n.max(0) as u64)
    }

    /// Views the user made inside the window; views of their own prompts
    /// are only counted when `include_own` is set
    pub fn views_in(&self, user_id: &str, window: DayWindow, include_own: bool) -> Result<u32> {
        let n: i64 = self.conn.query_row(
            r#"
            SELECT COUNT(*)
            FROM view_log
            WHERE user_id = ?1 AND (?4 OR own_prompt = 0)
              AND created_at >= ?2 AND created_at < ?3
            "#,
            params![user_id, window.start, window.end, include_own],
            |row| row.get(0),
        )?;
        Ok(u32::try_from(n).unwrap_or(u32::MAX))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::Database;
    use crate::types::from_timestamp;

    fn setup() -> Database {
        let db = Database::open_in_memory().unwrap();
        db.initialize().unwrap();
        let conn = db.connection().unwrap();
        conn.execute_batch(
            "INSERT INTO users (id, username, password_hash, created_at, updated_at) VALUES ('u1', 'alice', 'x', 0, 0);
             INSERT INTO users (id, username, password_hash, created_at, updated_at) VALUES ('u2', 'bob', 'x', 0, 0);
             INSERT INTO prompts (id, author_id, title, content, category, ai_model, created_at, updated_at)
                 VALUES ('mine', 'u1', 't', 'c', 'text', 'gpt4', 0, 0);
             INSERT INTO prompts (id, author_id, title, content, category, ai_model, created_at, updated_at)
                 VALUES ('theirs', 'u2', 't', 'c', 'text', 'gpt4', 0, 0);",
        )
        .unwrap();
        drop(conn);
        db
    }

    #[test]
    fn test_toggle_insert_is_idempotent() {
        let db = setup();
        let conn = db.connection().unwrap();
        let store = InteractionStore::new(&conn);

        assert!(store.insert_toggle("u1", "theirs", InteractionKind::Like, 1).unwrap());
        assert!(!store.insert_toggle("u1", "theirs", InteractionKind::Like, 2).unwrap());
        assert!(store.exists("u1", "theirs", InteractionKind::Like).unwrap());
        assert_eq!(store.count_for_prompt("theirs", InteractionKind::Like).unwrap(), 1);

        assert!(store.delete_toggle("u1", "theirs", InteractionKind::Like).unwrap());
        assert!(!store.delete_toggle("u1", "theirs", InteractionKind::Like).unwrap());
    }

    #[test]
    fn test_views_of_others_skip_own_prompts_and_other_days() {
        let db = setup();
        let conn = db.connection().unwrap();
        let store = InteractionStore::new(&conn);
        let window = DayWindow::containing(from_timestamp(86_400 * 10 + 500), 0);

        store.record_view("u1", "theirs", false, window.start).unwrap();
        store.record_view("u1", "theirs", false, window.start + 10).unwrap();
        store.record_view("u1", "mine", true, window.start + 20).unwrap();
        store.record_view("u1", "theirs", false, window.start - 1).unwrap();
        store.record_event(None, "theirs", InteractionKind::Share, window.start).unwrap();

        assert_eq!(store.views_in("u1", window, false).unwrap(), 2);
        assert_eq!(store.views_in("u1", window, true).unwrap(), 3);
        assert_eq!(store.views_in("u2", window, false).unwrap(), 0);
    }

    #[test]
    fn test_views_outlive_deleted_prompt() {
        let db = setup();
        let conn = db.connection().unwrap();
        let store = InteractionStore::new(&conn);
        let window = DayWindow::containing(from_timestamp(86_400 * 10 + 500), 0);

        store.record_view("u1", "theirs", false, window.start + 1).unwrap();
        conn.execute("DELETE FROM prompts WHERE id = 'theirs'", []).unwrap();

        assert_eq!(store.views_in("u1", window, false).unwrap(), 1);
    }
}
