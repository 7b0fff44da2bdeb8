use rusqlite::{Connection, OptionalExtension, Row, params};

use crate::types::{
    ParseWithDefault, Result, Session, SessionToken, User, UserStatus, enum_to_str,
    from_timestamp, log_filter_error, to_timestamp,
};

const USER_COLUMNS: &str = "id, username, password_hash, points, login_streak, last_login, created_at, updated_at, status";

/// Users and their sessions
pub struct UserStore<'c> {
    conn: &'c Connection,
}

impl<'c> UserStore<'c> {
    pub fn new(conn: &'c Connection) -> Self {
        Self { conn }
    }

    /// Insert a new user with a zero balance; points arrive through the ledger
    pub fn insert(&self, user: &User) -> Result<()> {
        self.conn.execute(
            r#"
            INSERT INTO users (id, username, password_hash, points, login_streak, last_login, created_at, updated_at, status)
            VALUES (?1, ?2, ?3, 0, ?4, ?5, ?6, ?7, ?8)
            "#,
            params![
                user.id,
                user.username,
                user.password_hash,
                user.login_streak,
                user.last_login.map(to_timestamp),
                to_timestamp(user.created_at),
                to_timestamp(user.updated_at),
                enum_to_str(&user.status),
            ],
        )?;
        Ok(())
    }

    pub fn get(&self, id: &str) -> Result<Option<User>> {
        let sql = format!("SELECT {} FROM users WHERE id = ?1", USER_COLUMNS);
        Ok(self
            .conn
            .query_row(&sql, params![id], Self::row_to_user)
            .optional()?)
    }

    /// Case-insensitive lookup
    pub fn find_by_username(&self, username: &str) -> Result<Option<User>> {
        let sql = format!("SELECT {} FROM users WHERE username = ?1", USER_COLUMNS);
        Ok(self
            .conn
            .query_row(&sql, params![username], Self::row_to_user)
            .optional()?)
    }

    pub fn username_exists(&self, username: &str) -> Result<bool> {
        let exists: bool = self.conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM users WHERE username = ?1)",
            params![username],
            |row| row.get(0),
        )?;
        Ok(exists)
    }

    pub fn record_login(&self, id: &str, streak: u32, at: i64) -> Result<()> {
        self.conn.execute(
            "UPDATE users SET login_streak = ?2, last_login = ?3, updated_at = ?3 WHERE id = ?1",
            params![id, streak, at],
        )?;
        Ok(())
    }

    pub fn update_password(&self, id: &str, password_hash: &str, at: i64) -> Result<()> {
        self.conn.execute(
            "UPDATE users SET password_hash = ?2, updated_at = ?3 WHERE id = ?1",
            params![id, password_hash, at],
        )?;
        Ok(())
    }

    pub fn set_status(&self, id: &str, status: UserStatus, at: i64) -> Result<()> {
        self.conn.execute(
            "UPDATE users SET status = ?2, updated_at = ?3 WHERE id = ?1",
            params![id, enum_to_str(&status), at],
        )?;
        Ok(())
    }

    /// Cached balance
    pub fn points(&self, id: &str) -> Result<Option<i64>> {
        Ok(self
            .conn
            .query_row(
                "SELECT points FROM users WHERE id = ?1",
                params![id],
                |row| row.get(0),
            )
            .optional()?)
    }

    /// Adjust the cached balance; the CHECK constraint rejects negative results
    pub fn add_points(&self, id: &str, delta: i64, at: i64) -> Result<i64> {
        let balance: i64 = self.conn.query_row(
            "UPDATE users SET points = points + ?2, updated_at = ?3 WHERE id = ?1 RETURNING points",
            params![id, delta, at],
            |row| row.get(0),
        )?;
        Ok(balance)
    }

    /// Overwrite the cached balance (used by the ledger audit repair)
    pub fn set_points(&self, id: &str, points: i64) -> Result<()> {
        self.conn.execute(
            "UPDATE users SET points = ?2 WHERE id = ?1",
            params![id, points],
        )?;
        Ok(())
    }

    /// Users ordered by balance, ties by username
    pub fn top_by_points(&self, limit: usize) -> Result<Vec<User>> {
        let sql = format!(
            "SELECT {} FROM users WHERE status = 'active' ORDER BY points DESC, username ASC LIMIT ?1",
            USER_COLUMNS
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let users = stmt
            .query_map(params![limit as i64], Self::row_to_user)?
            .filter_map(|r| log_filter_error(r, "reading user"))
            .collect();
        Ok(users)
    }

    pub fn all(&self) -> Result<Vec<User>> {
        let sql = format!("SELECT {} FROM users ORDER BY username", USER_COLUMNS);
        let mut stmt = self.conn.prepare(&sql)?;
        let users = stmt
            .query_map([], Self::row_to_user)?
            .filter_map(|r| log_filter_error(r, "reading user"))
            .collect();
        Ok(users)
    }

    // =========================================================================
    // Sessions
    // =========================================================================

    pub fn insert_session(&self, session: &Session) -> Result<()> {
        self.conn.execute(
            "INSERT INTO sessions (token, user_id, created_at, expires_at) VALUES (?1, ?2, ?3, ?4)",
            params![
                session.token.as_str(),
                session.user_id,
                to_timestamp(session.created_at),
                to_timestamp(session.expires_at),
            ],
        )?;
        Ok(())
    }

    pub fn get_session(&self, token: &SessionToken) -> Result<Option<Session>> {
        Ok(self
            .conn
            .query_row(
                "SELECT token, user_id, created_at, expires_at FROM sessions WHERE token = ?1",
                params![token.as_str()],
                |row| {
                    Ok(Session {
                        token: SessionToken::new(row.get::<_, String>(0)?),
                        user_id: row.get(1)?,
                        created_at: from_timestamp(row.get(2)?),
                        expires_at: from_timestamp(row.get(3)?),
                    })
                },
            )
            .optional()?)
    }

    pub fn delete_session(&self, token: &SessionToken) -> Result<bool> {
        let deleted = self.conn.execute(
            "DELETE FROM sessions WHERE token = ?1",
            params![token.as_str()],
        )?;
        Ok(deleted > 0)
    }

    /// Remove every expired session, returning how many were dropped
    pub fn purge_expired_sessions(&self, now: i64) -> Result<usize> {
        Ok(self
            .conn
            .execute("DELETE FROM sessions WHERE expires_at <= ?1", params![now])?)
    }

    fn row_to_user(row: &Row<'_>) -> rusqlite::Result<User> {
        let status: String = row.get(8)?;
        let streak: i64 = row.get(4)?;
        Ok(User {
            id: row.get(0)?,
            username: row.get(1)?,
            password_hash: row.get(2)?,
            points: row.get(3)?,
            login_streak: u32::try_from(streak).unwrap_or(0),
            last_login: row.get::<_, Option<i64>>(5)?.map(from_timestamp),
            created_at: from_timestamp(row.get(6)?),
            updated_at: from_timestamp(row.get(7)?),
            status: UserStatus::parse_or_default(&status),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::Database;
    use chrono::{TimeZone, Utc};

    fn sample_user(id: &str, username: &str) -> User {
        let at = Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap();
        User {
            id: id.to_string(),
            username: username.to_string(),
            password_hash: "hash".to_string(),
            points: 0,
            login_streak: 0,
            last_login: None,
            created_at: at,
            updated_at: at,
            status: UserStatus::Active,
        }
    }

    fn setup() -> Database {
        let db = Database::open_in_memory().unwrap();
        db.initialize().unwrap();
        db
    }

    #[test]
    fn test_insert_and_find_case_insensitive() {
        let db = setup();
        let conn = db.connection().unwrap();
        let store = UserStore::new(&conn);
        store.insert(&sample_user("u1", "Alice")).unwrap();

        let found = store.find_by_username("alice").unwrap().unwrap();
        assert_eq!(found.id, "u1");
        assert_eq!(found.username, "Alice");
        assert!(store.username_exists("ALICE").unwrap());
        assert!(store.insert(&sample_user("u2", "aLiCe")).is_err());
    }

    #[test]
    fn test_balance_cannot_go_negative() {
        let db = setup();
        let conn = db.connection().unwrap();
        let store = UserStore::new(&conn);
        store.insert(&sample_user("u1", "alice")).unwrap();

        assert_eq!(store.add_points("u1", 10, 0).unwrap(), 10);
        assert!(store.add_points("u1", -11, 0).is_err());
        assert_eq!(store.points("u1").unwrap(), Some(10));
    }

    #[test]
    fn test_sessions_round_trip_and_purge() {
        let db = setup();
        let conn = db.connection().unwrap();
        let store = UserStore::new(&conn);
        store.insert(&sample_user("u1", "alice")).unwrap();

        let session = Session {
            token: SessionToken::new("tok"),
            user_id: "u1".to_string(),
            created_at: from_timestamp(100),
            expires_at: from_timestamp(200),
        };
        store.insert_session(&session).unwrap();

        let loaded = store.get_session(&session.token).unwrap().unwrap();
        assert_eq!(loaded.user_id, "u1");
        assert_eq!(loaded.expires_at, from_timestamp(200));

        assert_eq!(store.purge_expired_sessions(150).unwrap(), 0);
        assert_eq!(store.purge_expired_sessions(200).unwrap(), 1);
        assert!(store.get_session(&session.token).unwrap().is_none());
    }

    #[test]
    fn test_top_by_points_ties_by_username() {
        let db = setup();
        let conn = db.connection().unwrap();
        let store = UserStore::new(&conn);
        for (id, name, pts) in [("u1", "carol", 50), ("u2", "bob", 80), ("u3", "alice", 50)] {
            store.insert(&sample_user(id, name)).unwrap();
            store.add_points(id, pts, 0).unwrap();
        }

        let names: Vec<String> = store
            .top_by_points(10)
            .unwrap()
            .into_iter()
            .map(|u| u.username)
            .collect();
        assert_eq!(names, vec!["bob", "alice", "carol"]);
    }
}
