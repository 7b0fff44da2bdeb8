use rusqlite::{Connection, Row, params};

use crate::types::{
    DayWindow, LedgerEntry, ParseWithDefault, PointReason, Result, enum_to_str, from_timestamp,
    log_filter_error,
};

/// Append-only points ledger
pub struct LedgerStore<'c> {
    conn: &'c Connection,
}

impl<'c> LedgerStore<'c> {
    pub fn new(conn: &'c Connection) -> Self {
        Self { conn }
    }

    /// Append an entry; returns false when (user, reason, reference) was already recorded
    pub fn append(
        &self,
        user_id: &str,
        delta: i64,
        reason: PointReason,
        reference: &str,
        at: i64,
    ) -> Result<bool> {
        let inserted = self.conn.execute(
            r#"
            INSERT OR IGNORE INTO point_ledger (user_id, delta, reason, reference, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5)
            "#,
            params![user_id, delta, enum_to_str(&reason), reference, at],
        )?;
        Ok(inserted > 0)
    }

    pub fn exists(&self, user_id: &str, reason: PointReason, reference: &str) -> Result<bool> {
        let exists: bool = self.conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM point_ledger WHERE user_id = ?1 AND reason = ?2 AND reference = ?3)",
            params![user_id, enum_to_str(&reason), reference],
            |row| row.get(0),
        )?;
        Ok(exists)
    }

    /// Sum of every entry of the user
    #[cfg(test)]
    pub fn total(&self, user_id: &str) -> Result<i64> {
        let total: i64 = self.conn.query_row(
            "SELECT COALESCE(SUM(delta), 0) FROM point_ledger WHERE user_id = ?1",
            params![user_id],
            |row| row.get(0),
        )?;
        Ok(total)
    }

    /// Points earned from capped rewards inside the window
    pub fn capped_earned_in(&self, user_id: &str, window: DayWindow) -> Result<i64> {
        let capped: Vec<String> = PointReason::ALL
            .iter()
            .filter(|r| r.is_capped())
            .map(enum_to_str)
            .collect();
        let placeholders = (0..capped.len())
            .map(|i| format!("?{}", i + 4))
            .collect::<Vec<_>>()
            .join(", ");
        let sql = format!(
            r#"
            SELECT COALESCE(SUM(delta), 0) FROM point_ledger
            WHERE user_id = ?1 AND created_at >= ?2 AND created_at < ?3
              AND delta > 0 AND reason IN ({})
            "#,
            placeholders
        );

        let mut args: Vec<&dyn rusqlite::ToSql> = vec![&user_id, &window.start, &window.end];
        args.extend(capped.iter().map(|r| r as &dyn rusqlite::ToSql));

        let earned: i64 = self
            .conn
            .query_row(&sql, args.as_slice(), |row| row.get(0))?;
        Ok(earned)
    }

    /// Most recent entries first
    pub fn history(&self, user_id: &str, limit: usize) -> Result<Vec<LedgerEntry>> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT id, user_id, delta, reason, reference, created_at
            FROM point_ledger
            WHERE user_id = ?1
            ORDER BY created_at DESC, id DESC
            LIMIT ?2
            "#,
        )?;
        let entries = stmt
            .query_map(params![user_id, limit as i64], Self::row_to_entry)?
            .filter_map(|r| log_filter_error(r, "reading ledger entry"))
            .collect();
        Ok(entries)
    }

    /// Ledger sum of every user, including users without entries
    pub fn totals_by_user(&self) -> Result<Vec<(String, i64)>> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT u.id, COALESCE(SUM(l.delta), 0)
            FROM users u
            LEFT JOIN point_ledger l ON l.user_id = u.id
            GROUP BY u.id
            ORDER BY u.id
            "#,
        )?;
        let totals = stmt
            .query_map([], |row| Ok((row.get(0)?, row.get(1)?)))?
            .filter_map(|r| log_filter_error(r, "reading ledger total"))
            .collect();
        Ok(totals)
    }

    fn row_to_entry(row: &Row<'_>) -> rusqlite::Result<LedgerEntry> {
        let reason: String = row.get(3)?;
        Ok(LedgerEntry {
            id: row.get(0)?,
            user_id: row.get(1)?,
            delta: row.get(2)?,
            reason: PointReason::parse_or_default(&reason),
            reference: row.get(4)?,
            created_at: from_timestamp(row.get(5)?),
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

    #[test]
    fn test_append_is_unique_per_reference() {
        let db = setup();
        let conn = db.connection().unwrap();
        let ledger = LedgerStore::new(&conn);

        assert!(ledger.append("u1", 5, PointReason::LikeReceived, "p1:u2", 10).unwrap());
        assert!(!ledger.append("u1", 5, PointReason::LikeReceived, "p1:u2", 11).unwrap());
        assert!(ledger.append("u1", 5, PointReason::LikeReceived, "p1:u3", 12).unwrap());
        assert!(ledger.exists("u1", PointReason::LikeReceived, "p1:u2").unwrap());
        assert_eq!(ledger.total("u1").unwrap(), 10);
    }

    #[test]
    fn test_capped_earned_ignores_welcome_and_charges() {
        let db = setup();
        let conn = db.connection().unwrap();
        let ledger = LedgerStore::new(&conn);
        let window = DayWindow::containing(from_timestamp(86_400 * 3 + 10), 0);

        ledger.append("u1", 100, PointReason::WelcomeBonus, "u1", window.start).unwrap();
        ledger.append("u1", 50, PointReason::PromptCreated, "p1", window.start + 1).unwrap();
        ledger.append("u1", -1, PointReason::ViewCharge, "view:1", window.start + 2).unwrap();
        ledger.append("u1", 3, PointReason::CommentCreated, "c0", window.start - 5).unwrap();

        assert_eq!(ledger.capped_earned_in("u1", window).unwrap(), 50);
        assert_eq!(ledger.total("u1").unwrap(), 152);
    }

    #[test]
    fn test_history_newest_first() {
        let db = setup();
        let conn = db.connection().unwrap();
        let ledger = LedgerStore::new(&conn);
        ledger.append("u1", 100, PointReason::WelcomeBonus, "u1", 1).unwrap();
        ledger.append("u1", 5, PointReason::DailyLogin, "1970-01-01", 2).unwrap();

        let history = ledger.history("u1", 10).unwrap();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].reason, PointReason::DailyLogin);
        assert_eq!(ledger.history("u1", 1).unwrap().len(), 1);
        assert_eq!(ledger.totals_by_user().unwrap(), vec![("u1".to_string(), 105)]);
    }
}
