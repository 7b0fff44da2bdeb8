use rusqlite::{Connection, OptionalExtension, Row, params};

use crate::types::{
    ParseWithDefault, Prompt, PromptStats, PromptStatus, Result, StatField, enum_to_str,
    from_timestamp, log_filter_error, to_timestamp,
};

const PROMPT_SELECT: &str = r#"
    SELECT p.id, p.author_id, u.username, p.title, p.content, p.description, p.category,
           p.ai_model, p.tags, p.likes, p.bookmarks, p.shares, p.comments, p.views,
           p.created_at, p.updated_at, p.status
    FROM prompts p
    JOIN users u ON u.id = p.author_id
"#;

/// Prompt cards and their denormalized counters
pub struct PromptStore<'c> {
    conn: &'c Connection,
}

impl<'c> PromptStore<'c> {
    pub fn new(conn: &'c Connection) -> Self {
        Self { conn }
    }

    pub fn insert(&self, prompt: &Prompt) -> Result<()> {
        let tags = serde_json::to_string(&prompt.tags)?;
        self.conn.execute(
            r#"
            INSERT INTO prompts (id, author_id, title, content, description, category, ai_model, tags,
                                 created_at, updated_at, status)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
            "#,
            params![
                prompt.id,
                prompt.author_id,
                prompt.title,
                prompt.content,
                prompt.description,
                prompt.category,
                prompt.ai_model,
                tags,
                to_timestamp(prompt.created_at),
                to_timestamp(prompt.updated_at),
                enum_to_str(&prompt.status),
            ],
        )?;
        Ok(())
    }

    /// Persist editable fields and status; counters are left alone
    pub fn update(&self, prompt: &Prompt) -> Result<()> {
        let tags = serde_json::to_string(&prompt.tags)?;
        self.conn.execute(
            r#"
            UPDATE prompts
            SET title = ?2, content = ?3, description = ?4, category = ?5, ai_model = ?6,
                tags = ?7, updated_at = ?8, status = ?9
            WHERE id = ?1
            "#,
            params![
                prompt.id,
                prompt.title,
                prompt.content,
                prompt.description,
                prompt.category,
                prompt.ai_model,
                tags,
                to_timestamp(prompt.updated_at),
                enum_to_str(&prompt.status),
            ],
        )?;
        Ok(())
    }

    pub fn get(&self, id: &str) -> Result<Option<Prompt>> {
        let sql = format!("{} WHERE p.id = ?1", PROMPT_SELECT);
        Ok(self
            .conn
            .query_row(&sql, params![id], Self::row_to_prompt)
            .optional()?)
    }

    /// Remove a prompt; comments and interactions go with it
    pub fn delete(&self, id: &str) -> Result<bool> {
        let deleted = self
            .conn
            .execute("DELETE FROM prompts WHERE id = ?1", params![id])?;
        Ok(deleted > 0)
    }

    /// Every published prompt, newest first
    pub fn published(&self) -> Result<Vec<Prompt>> {
        let sql = format!(
            "{} WHERE p.status = 'published' ORDER BY p.created_at DESC, p.rowid DESC",
            PROMPT_SELECT
        );
        self.query_list(&sql, &[])
    }

    /// A user's prompts in any status, newest first
    pub fn by_author(&self, author_id: &str) -> Result<Vec<Prompt>> {
        let sql = format!(
            "{} WHERE p.author_id = ?1 ORDER BY p.created_at DESC, p.rowid DESC",
            PROMPT_SELECT
        );
        self.query_list(&sql, &[&author_id])
    }

    /// Prompts the user has bookmarked, most recently bookmarked first
    pub fn bookmarked_by(&self, user_id: &str) -> Result<Vec<Prompt>> {
        let sql = format!(
            r#"{}
            JOIN interactions i ON i.prompt_id = p.id
            WHERE i.user_id = ?1 AND i.kind = 'bookmark' AND p.status = 'published'
            ORDER BY i.created_at DESC, i.id DESC"#,
            PROMPT_SELECT
        );
        self.query_list(&sql, &[&user_id])
    }

    pub fn count_by_author(&self, author_id: &str) -> Result<u64> {
        let n: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM prompts WHERE author_id = ?1",
            params![author_id],
            |row| row.get(0),
        )?;
        Ok(n.max(0) as u64)
    }

    /// Sum of likes over a user's prompts
    pub fn likes_received(&self, author_id: &str) -> Result<u64> {
        let n: i64 = self.conn.query_row(
            "SELECT COALESCE(SUM(likes), 0) FROM prompts WHERE author_id = ?1",
            params![author_id],
            |row| row.get(0),
        )?;
        Ok(n.max(0) as u64)
    }

    // =========================================================================
    // Counters
    // =========================================================================

    /// Add `delta` to a counter, flooring at zero; returns the new value
    pub fn adjust_stat(&self, id: &str, field: StatField, delta: i64) -> Result<u64> {
        let sql = format!(
            "UPDATE prompts SET {col} = MAX({col} + ?2, 0) WHERE id = ?1 RETURNING {col}",
            col = field.column()
        );
        let value: i64 = self
            .conn
            .query_row(&sql, params![id, delta], |row| row.get(0))?;
        Ok(value.max(0) as u64)
    }

    pub fn set_stat(&self, id: &str, field: StatField, value: u64) -> Result<()> {
        let sql = format!("UPDATE prompts SET {} = ?2 WHERE id = ?1", field.column());
        self.conn.execute(&sql, params![id, value as i64])?;
        Ok(())
    }

    /// Recompute every counter of every prompt from the ledgers.
    /// Returns the number of prompts whose counters changed.
    pub fn resync_all(&self) -> Result<usize> {
        let changed = self.conn.execute(
            r#"
            UPDATE prompts SET
                likes = (SELECT COUNT(*) FROM interactions i WHERE i.prompt_id = prompts.id AND i.kind = 'like'),
                bookmarks = (SELECT COUNT(*) FROM interactions i WHERE i.prompt_id = prompts.id AND i.kind = 'bookmark'),
                shares = (SELECT COUNT(*) FROM interactions i WHERE i.prompt_id = prompts.id AND i.kind = 'share'),
                views = (SELECT COUNT(*) FROM interactions i WHERE i.prompt_id = prompts.id AND i.kind = 'view'),
                comments = (SELECT COUNT(*) FROM comments c WHERE c.prompt_id = prompts.id AND c.status = 'active')
            WHERE likes != (SELECT COUNT(*) FROM interactions i WHERE i.prompt_id = prompts.id AND i.kind = 'like')
               OR bookmarks != (SELECT COUNT(*) FROM interactions i WHERE i.prompt_id = prompts.id AND i.kind = 'bookmark')
               OR shares != (SELECT COUNT(*) FROM interactions i WHERE i.prompt_id = prompts.id AND i.kind = 'share')
               OR views != (SELECT COUNT(*) FROM interactions i WHERE i.prompt_id = prompts.id AND i.kind = 'view')
               OR comments != (SELECT COUNT(*) FROM comments c WHERE c.prompt_id = prompts.id AND c.status = 'active')
            "#,
            [],
        )?;
        Ok(changed)
    }

    fn query_list(&self, sql: &str, args: &[&dyn rusqlite::ToSql]) -> Result<Vec<Prompt>> {
        let mut stmt = self.conn.prepare(sql)?;
        let prompts = stmt
            .query_map(args, Self::row_to_prompt)?
            .filter_map(|r| log_filter_error(r, "reading prompt"))
            .collect();
        Ok(prompts)
    }

    fn row_to_prompt(row: &Row<'_>) -> rusqlite::Result<Prompt> {
        let tags_json: String = row.get(8)?;
        let tags: Vec<String> = serde_json::from_str(&tags_json).unwrap_or_else(|e| {
            tracing::warn!("Invalid tags JSON '{}': {}", tags_json, e);
            Vec::new()
        });
        let status: String = row.get(16)?;
        let count = |idx: usize| -> rusqlite::Result<u64> {
            Ok(row.get::<_, i64>(idx)?.max(0) as u64)
        };

        Ok(Prompt {
            id: row.get(0)?,
            author_id: row.get(1)?,
            author_name: row.get(2)?,
            title: row.get(3)?,
            content: row.get(4)?,
            description: row.get(5)?,
            category: row.get(6)?,
            ai_model: row.get(7)?,
            tags,
            stats: PromptStats {
                likes: count(9)?,
                bookmarks: count(10)?,
                shares: count(11)?,
                comments: count(12)?,
                views: count(13)?,
            },
            created_at: from_timestamp(row.get(14)?),
            updated_at: from_timestamp(row.get(15)?),
            status: PromptStatus::parse_or_default(&status),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::Database;

    fn setup() -> Database {
        let db = Database::open_in_memory().unwrap();
        db.initialize().unwrap();
        db.execute(
            "INSERT INTO users (id, username, password_hash, created_at, updated_at) VALUES ('u1', 'alice', 'x', 0, 0)",
            &[],
        )
        .unwrap();
        db
    }

    fn sample_prompt(id: &str, created: i64) -> Prompt {
        Prompt {
            id: id.to_string(),
            author_id: "u1".to_string(),
            author_name: String::new(),
            title: format!("Prompt {}", id),
            content: "Write a haiku".to_string(),
            description: String::new(),
            category: "writing".to_string(),
            ai_model: "claude".to_string(),
            tags: vec!["poetry".to_string(), "haiku".to_string()],
            stats: PromptStats::default(),
            created_at: from_timestamp(created),
            updated_at: from_timestamp(created),
            status: PromptStatus::Published,
        }
    }

    #[test]
    fn test_insert_and_get_joins_author() {
        let db = setup();
        let conn = db.connection().unwrap();
        let store = PromptStore::new(&conn);
        store.insert(&sample_prompt("p1", 10)).unwrap();

        let loaded = store.get("p1").unwrap().unwrap();
        assert_eq!(loaded.author_name, "alice");
        assert_eq!(loaded.tags, vec!["poetry", "haiku"]);
        assert_eq!(loaded.stats, PromptStats::default());
        assert!(store.get("missing").unwrap().is_none());
    }

    #[test]
    fn test_adjust_stat_floors_at_zero() {
        let db = setup();
        let conn = db.connection().unwrap();
        let store = PromptStore::new(&conn);
        store.insert(&sample_prompt("p1", 10)).unwrap();

        assert_eq!(store.adjust_stat("p1", StatField::Likes, 1).unwrap(), 1);
        assert_eq!(store.adjust_stat("p1", StatField::Likes, -1).unwrap(), 0);
        assert_eq!(store.adjust_stat("p1", StatField::Likes, -1).unwrap(), 0);
    }

    #[test]
    fn test_published_excludes_archived_and_orders_newest_first() {
        let db = setup();
        let conn = db.connection().unwrap();
        let store = PromptStore::new(&conn);
        store.insert(&sample_prompt("old", 10)).unwrap();
        store.insert(&sample_prompt("new", 20)).unwrap();
        let mut archived = sample_prompt("gone", 30);
        archived.status = PromptStatus::Archived;
        store.insert(&archived).unwrap();

        let ids: Vec<String> = store.published().unwrap().into_iter().map(|p| p.id).collect();
        assert_eq!(ids, vec!["new", "old"]);
        assert_eq!(store.by_author("u1").unwrap().len(), 3);
        assert_eq!(store.count_by_author("u1").unwrap(), 3);
    }

    #[test]
    fn test_resync_repairs_drift() {
        let db = setup();
        let conn = db.connection().unwrap();
        let store = PromptStore::new(&conn);
        store.insert(&sample_prompt("p1", 10)).unwrap();
        conn.execute(
            "INSERT INTO interactions (user_id, prompt_id, kind, created_at) VALUES ('u1', 'p1', 'like', 0)",
            [],
        )
        .unwrap();
        store.set_stat("p1", StatField::Views, 7).unwrap();

        assert_eq!(store.resync_all().unwrap(), 1);
        let stats = store.get("p1").unwrap().unwrap().stats;
        assert_eq!(stats.likes, 1);
        assert_eq!(stats.views, 0);
        assert_eq!(store.resync_all().unwrap(), 0);
    }

    #[test]
    fn test_delete_cascades_interactions() {
        let db = setup();
        let conn = db.connection().unwrap();
        let store = PromptStore::new(&conn);
        store.insert(&sample_prompt("p1", 10)).unwrap();
        conn.execute(
            "INSERT INTO interactions (user_id, prompt_id, kind, created_at) VALUES ('u1', 'p1', 'view', 0)",
            [],
        )
        .unwrap();

        assert!(store.delete("p1").unwrap());
        let left: i64 = conn
            .query_row("SELECT COUNT(*) FROM interactions", [], |row| row.get(0))
            .unwrap();
        assert_eq!(left, 0);
        assert!(!store.delete("p1").unwrap());
    }
}
