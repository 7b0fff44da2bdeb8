use rusqlite::{Connection, OptionalExtension, Row, params};

use crate::types::{
    Comment, CommentStatus, DELETED_COMMENT_TEXT, ParseWithDefault, Result, enum_to_str,
    from_timestamp, log_filter_error, to_timestamp,
};

const COMMENT_SELECT: &str = r#"
    SELECT c.id, c.prompt_id, c.author_id, u.username, c.content, c.parent_id, c.likes,
           c.status, c.created_at, c.updated_at
    FROM comments c
    JOIN users u ON u.id = c.author_id
"#;

/// Comments and the comment-like ledger
pub struct CommentStore<'c> {
    conn: &'c Connection,
}

impl<'c> CommentStore<'c> {
    pub fn new(conn: &'c Connection) -> Self {
        Self { conn }
    }

    pub fn insert(&self, comment: &Comment) -> Result<()> {
        self.conn.execute(
            r#"
            INSERT INTO comments (id, prompt_id, author_id, parent_id, content, likes, status, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5, 0, ?6, ?7, ?8)
            "#,
            params![
                comment.id,
                comment.prompt_id,
                comment.author_id,
                comment.parent_id,
                comment.content,
                enum_to_str(&comment.status),
                to_timestamp(comment.created_at),
                to_timestamp(comment.updated_at),
            ],
        )?;
        Ok(())
    }

    pub fn get(&self, id: &str) -> Result<Option<Comment>> {
        let sql = format!("{} WHERE c.id = ?1", COMMENT_SELECT);
        Ok(self
            .conn
            .query_row(&sql, params![id], Self::row_to_comment)
            .optional()?)
    }

    /// Mark deleted and replace the text with the placeholder
    pub fn soft_delete(&self, id: &str, at: i64) -> Result<()> {
        self.conn.execute(
            "UPDATE comments SET status = 'deleted', content = ?2, updated_at = ?3 WHERE id = ?1",
            params![id, DELETED_COMMENT_TEXT, at],
        )?;
        Ok(())
    }

    /// Every comment of a prompt in creation order, deleted ones included
    pub fn for_prompt(&self, prompt_id: &str) -> Result<Vec<Comment>> {
        let sql = format!(
            "{} WHERE c.prompt_id = ?1 ORDER BY c.created_at ASC, c.rowid ASC",
            COMMENT_SELECT
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let comments = stmt
            .query_map(params![prompt_id], Self::row_to_comment)?
            .filter_map(|r| log_filter_error(r, "reading comment"))
            .collect();
        Ok(comments)
    }

    pub fn count_active(&self, prompt_id: &str) -> Result<u64> {
        let n: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM comments WHERE prompt_id = ?1 AND status = 'active'",
            params![prompt_id],
            |row| row.get(0),
        )?;
        Ok(n.max(0) as u64)
    }

    // =========================================================================
    // Comment likes
    // =========================================================================

    #[cfg(test)]
    pub fn is_liked(&self, comment_id: &str, user_id: &str) -> Result<bool> {
        let exists: bool = self.conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM comment_likes WHERE comment_id = ?1 AND user_id = ?2)",
            params![comment_id, user_id],
            |row| row.get(0),
        )?;
        Ok(exists)
    }

    /// Flip the user's like and refresh the counter; returns (liked, count)
    pub fn toggle_like(&self, comment_id: &str, user_id: &str, at: i64) -> Result<(bool, u64)> {
        let removed = self.conn.execute(
            "DELETE FROM comment_likes WHERE comment_id = ?1 AND user_id = ?2",
            params![comment_id, user_id],
        )?;
        if removed == 0 {
            self.conn.execute(
                "INSERT INTO comment_likes (comment_id, user_id, created_at) VALUES (?1, ?2, ?3)",
                params![comment_id, user_id, at],
            )?;
        }

        let count: i64 = self.conn.query_row(
            r#"
            UPDATE comments
            SET likes = (SELECT COUNT(*) FROM comment_likes WHERE comment_id = ?1)
            WHERE id = ?1
            RETURNING likes
            "#,
            params![comment_id],
            |row| row.get(0),
        )?;
        Ok((removed == 0, count.max(0) as u64))
    }

    fn row_to_comment(row: &Row<'_>) -> rusqlite::Result<Comment> {
        let status: String = row.get(7)?;
        Ok(Comment {
            id: row.get(0)?,
            prompt_id: row.get(1)?,
            author_id: row.get(2)?,
            author_name: row.get(3)?,
            content: row.get(4)?,
            parent_id: row.get(5)?,
            likes: row.get::<_, i64>(6)?.max(0) as u64,
            status: CommentStatus::parse_or_default(&status),
            created_at: from_timestamp(row.get(8)?),
            updated_at: from_timestamp(row.get(9)?),
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
        let conn = db.connection().unwrap();
        conn.execute_batch(
            "INSERT INTO users (id, username, password_hash, created_at, updated_at) VALUES ('u1', 'alice', 'x', 0, 0);
             INSERT INTO users (id, username, password_hash, created_at, updated_at) VALUES ('u2', 'bob', 'x', 0, 0);
             INSERT INTO prompts (id, author_id, title, content, category, ai_model, created_at, updated_at)
                 VALUES ('p1', 'u1', 't', 'c', 'text', 'gpt4', 0, 0);",
        )
        .unwrap();
        drop(conn);
        db
    }

    fn comment(id: &str, parent: Option<&str>, at: i64) -> Comment {
        Comment {
            id: id.to_string(),
            prompt_id: "p1".to_string(),
            author_id: "u2".to_string(),
            author_name: String::new(),
            content: format!("comment {}", id),
            parent_id: parent.map(str::to_string),
            likes: 0,
            status: CommentStatus::Active,
            created_at: from_timestamp(at),
            updated_at: from_timestamp(at),
        }
    }

    #[test]
    fn test_soft_delete_keeps_row_with_placeholder() {
        let db = setup();
        let conn = db.connection().unwrap();
        let store = CommentStore::new(&conn);
        store.insert(&comment("c1", None, 1)).unwrap();
        store.insert(&comment("c2", Some("c1"), 2)).unwrap();
        assert_eq!(store.count_active("p1").unwrap(), 2);

        store.soft_delete("c1", 3).unwrap();
        let deleted = store.get("c1").unwrap().unwrap();
        assert_eq!(deleted.status, CommentStatus::Deleted);
        assert_eq!(deleted.content, DELETED_COMMENT_TEXT);
        assert_eq!(store.count_active("p1").unwrap(), 1);
        assert_eq!(store.for_prompt("p1").unwrap().len(), 2);
    }

    #[test]
    fn test_comment_like_toggle() {
        let db = setup();
        let conn = db.connection().unwrap();
        let store = CommentStore::new(&conn);
        store.insert(&comment("c1", None, 1)).unwrap();

        assert_eq!(store.toggle_like("c1", "u1", 5).unwrap(), (true, 1));
        assert!(store.is_liked("c1", "u1").unwrap());
        assert_eq!(store.toggle_like("c1", "u2", 6).unwrap(), (true, 2));
        assert_eq!(store.toggle_like("c1", "u1", 7).unwrap(), (false, 1));
        assert_eq!(store.get("c1").unwrap().unwrap().likes, 1);
    }
}
