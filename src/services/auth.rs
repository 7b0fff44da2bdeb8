//! Registration, login and sessions.

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use chrono::Duration;
use secrecy::{ExposeSecret, SecretString};
use tracing::{debug, info, warn};

use super::ServiceContext;
use crate::storage::UserStore;
use crate::types::{
    HubError, PointReason, Result, Session, SessionToken, User, UserStatus, ValidationError,
    ValidationErrorKind, char_len, new_id, to_timestamp,
};

pub struct AuthService<'a> {
    ctx: &'a ServiceContext,
}

impl<'a> AuthService<'a> {
    pub fn new(ctx: &'a ServiceContext) -> Self {
        Self { ctx }
    }

    /// Create an account and pay the welcome bonus
    pub fn register(&self, username: &str, password: &SecretString) -> Result<User> {
        let username = username.trim();
        self.validate_username(username)?;
        let password = password.expose_secret().trim();
        self.validate_password(password)?;

        let password_hash = hash_password(password)?;
        let now = self.ctx.now();
        let user = User {
            id: new_id(),
            username: username.to_string(),
            password_hash,
            points: 0,
            login_streak: 0,
            last_login: None,
            created_at: now,
            updated_at: now,
            status: UserStatus::Active,
        };

        self.ctx.db.transaction(|conn| {
            let users = UserStore::new(conn);
            if users.username_exists(username)? {
                return Err(HubError::UsernameTaken(username.to_string()));
            }
            users.insert(&user)?;
            self.ctx.points().grant_in(
                conn,
                &user.id,
                PointReason::WelcomeBonus,
                &user.id,
                self.ctx.config.points.welcome_bonus,
            )?;
            Ok(())
        })?;

        info!(user_id = %user.id, username, "User registered");
        self.ctx.users().get(&user.id)
    }

    /// Verify credentials and open a session.
    ///
    /// The first login of a day pays the daily reward and extends the streak.
    pub fn login(&self, username: &str, password: &SecretString) -> Result<Session> {
        let username = username.trim();
        let conn = self.ctx.db.connection()?;
        let user = UserStore::new(&conn).find_by_username(username)?;
        drop(conn);

        let Some(user) = user else {
            debug!(username, "Login for unknown user");
            return Err(HubError::InvalidCredentials);
        };
        if !verify_password(password.expose_secret().trim(), &user.password_hash) {
            debug!(username, "Login with wrong password");
            return Err(HubError::InvalidCredentials);
        }
        if user.status == UserStatus::Banned {
            warn!(user_id = %user.id, "Banned user attempted login");
            return Err(HubError::forbidden("this account is banned"));
        }

        let now = self.ctx.now();
        let today = self.ctx.today();
        let session = Session {
            token: SessionToken::generate(),
            user_id: user.id.clone(),
            created_at: now,
            expires_at: now + Duration::seconds(self.session_timeout_secs()),
        };

        self.ctx.db.transaction(|conn| {
            let users = UserStore::new(conn);
            users.purge_expired_sessions(to_timestamp(now))?;

            let last = user.last_login.map(to_timestamp);
            let first_today = !last.is_some_and(|ts| today.contains(ts));
            if first_today {
                let streak = match last {
                    Some(ts) if today.previous().contains(ts) => user.login_streak.saturating_add(1),
                    _ => 1,
                };
                users.record_login(&user.id, streak, to_timestamp(now))?;
                self.ctx.points().grant_in(
                    conn,
                    &user.id,
                    PointReason::DailyLogin,
                    &today.label(),
                    self.ctx.config.points.daily_login,
                )?;
            } else {
                users.record_login(&user.id, user.login_streak, to_timestamp(now))?;
            }

            users.insert_session(&session)
        })?;

        info!(user_id = %user.id, "User logged in");
        Ok(session)
    }

    /// Drop the session; unknown tokens are ignored
    pub fn logout(&self, token: &SessionToken) -> Result<()> {
        let conn = self.ctx.db.connection()?;
        if UserStore::new(&conn).delete_session(token)? {
            info!("Session closed");
        }
        Ok(())
    }

    /// Resolve a session token to its user
    pub fn current_user(&self, token: Option<&SessionToken>) -> Result<User> {
        let token = token.ok_or(HubError::NotLoggedIn)?;
        let conn = self.ctx.db.connection()?;
        let users = UserStore::new(&conn);

        let session = users.get_session(token)?.ok_or(HubError::NotLoggedIn)?;
        if session.is_expired(self.ctx.now()) {
            users.delete_session(token)?;
            debug!(user_id = %session.user_id, "Session expired");
            return Err(HubError::SessionExpired);
        }

        let user = users
            .get(&session.user_id)?
            .ok_or(HubError::NotLoggedIn)?;
        if user.status == UserStatus::Banned {
            users.delete_session(token)?;
            return Err(HubError::forbidden("this account is banned"));
        }
        Ok(user)
    }

    pub fn change_password(
        &self,
        user: &User,
        current: &SecretString,
        new: &SecretString,
    ) -> Result<()> {
        let conn = self.ctx.db.connection()?;
        let users = UserStore::new(&conn);
        let stored = users
            .get(&user.id)?
            .ok_or_else(|| HubError::not_found("user", &user.id))?;

        if !verify_password(current.expose_secret().trim(), &stored.password_hash) {
            return Err(HubError::InvalidCredentials);
        }
        let new = new.expose_secret().trim();
        self.validate_password(new)?;

        users.update_password(&user.id, &hash_password(new)?, to_timestamp(self.ctx.now()))?;
        info!(user_id = %user.id, "Password changed");
        Ok(())
    }

    /// Ban or reinstate a user; banning also ends their sessions on next use
    pub fn set_status(&self, user_id: &str, status: UserStatus) -> Result<()> {
        let conn = self.ctx.db.connection()?;
        let users = UserStore::new(&conn);
        if users.get(user_id)?.is_none() {
            return Err(HubError::not_found("user", user_id));
        }
        users.set_status(user_id, status, to_timestamp(self.ctx.now()))?;
        info!(user_id, ?status, "User status changed");
        Ok(())
    }

    fn session_timeout_secs(&self) -> i64 {
        let secs = self.ctx.config.security.session_timeout_secs.min(u64::from(u32::MAX));
        i64::try_from(secs).unwrap_or(i64::from(u32::MAX))
    }

    fn validate_username(&self, username: &str) -> Result<()> {
        let security = &self.ctx.config.security;
        let len = char_len(username);
        if len == 0 {
            return Err(ValidationError::missing("username").into());
        }
        if len < security.min_username_length {
            return Err(ValidationError::too_short("username", security.min_username_length, len).into());
        }
        if len > security.max_username_length {
            return Err(ValidationError::too_long("username", security.max_username_length, len).into());
        }
        if !username
            .chars()
            .all(|c| c.is_alphanumeric() || matches!(c, '_' | '.' | '-'))
        {
            return Err(ValidationError::new(
                ValidationErrorKind::Format,
                "may only contain letters, digits, '_', '.' and '-'",
            )
            .with_field("username")
            .into());
        }
        Ok(())
    }

    fn validate_password(&self, password: &str) -> Result<()> {
        let min = self.ctx.config.security.min_password_length;
        let len = char_len(password);
        if len < min {
            return Err(ValidationError::too_short("password", min, len).into());
        }
        Ok(())
    }
}

fn hash_password(password: &str) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    Ok(Argon2::default()
        .hash_password(password.as_bytes(), &salt)?
        .to_string())
}

fn verify_password(password: &str, stored: &str) -> bool {
    match PasswordHash::new(stored) {
        Ok(parsed) => Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok(),
        Err(e) => {
            warn!("Stored password hash is unreadable: {}", e);
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::testing::{context, register, reload};

    fn secret(s: &str) -> SecretString {
        SecretString::from(s.to_string())
    }

    #[test]
    fn test_register_pays_welcome_bonus() {
        let (ctx, _) = context();
        let user = ctx.auth().register("  alice  ", &secret("secret-pw")).unwrap();

        assert_eq!(user.username, "alice");
        assert_eq!(user.points, 100);
        assert!(user.password_hash.starts_with("$argon2"));
        assert_eq!(ctx.points().history(&user.id, 10).unwrap().len(), 1);
    }

    #[test]
    fn test_register_rejects_duplicate_ignoring_case() {
        let (ctx, _) = context();
        register(&ctx, "alice");
        let err = ctx.auth().register("ALICE", &secret("secret-pw")).unwrap_err();
        assert!(matches!(err, HubError::UsernameTaken(_)));
    }

    #[test]
    fn test_register_validation() {
        let (ctx, _) = context();
        let auth = ctx.auth();
        assert!(matches!(
            auth.register("ab", &secret("secret-pw")),
            Err(HubError::Validation(_))
        ));
        assert!(matches!(
            auth.register("alice", &secret("12345")),
            Err(HubError::Validation(_))
        ));
        assert!(matches!(
            auth.register("al ice", &secret("secret-pw")),
            Err(HubError::Validation(_))
        ));
        assert!(auth.register("김철수", &secret("secret-pw")).is_ok());
    }

    #[test]
    fn test_login_same_error_for_unknown_user_and_bad_password() {
        let (ctx, _) = context();
        register(&ctx, "alice");
        let auth = ctx.auth();

        assert!(matches!(
            auth.login("nobody", &secret("secret-pw")),
            Err(HubError::InvalidCredentials)
        ));
        assert!(matches!(
            auth.login("alice", &secret("wrong-pw")),
            Err(HubError::InvalidCredentials)
        ));
    }

    #[test]
    fn test_daily_login_reward_once_per_day_and_streak() {
        let (ctx, clock) = context();
        let alice = register(&ctx, "alice");
        let auth = ctx.auth();

        auth.login("alice", &secret("secret-pw")).unwrap();
        auth.login("alice", &secret("secret-pw")).unwrap();
        let after_first_day = reload(&ctx, &alice);
        assert_eq!(after_first_day.points, 105);
        assert_eq!(after_first_day.login_streak, 1);

        clock.advance(Duration::days(1));
        auth.login("alice", &secret("secret-pw")).unwrap();
        let next_day = reload(&ctx, &alice);
        assert_eq!(next_day.points, 110);
        assert_eq!(next_day.login_streak, 2);

        clock.advance(Duration::days(3));
        auth.login("alice", &secret("secret-pw")).unwrap();
        assert_eq!(reload(&ctx, &alice).login_streak, 1);
    }

    #[test]
    fn test_session_lifecycle() {
        let (ctx, clock) = context();
        let alice = register(&ctx, "alice");
        let auth = ctx.auth();

        assert!(matches!(auth.current_user(None), Err(HubError::NotLoggedIn)));

        let session = auth.login("alice", &secret("secret-pw")).unwrap();
        assert_eq!(auth.current_user(Some(&session.token)).unwrap().id, alice.id);

        clock.advance(Duration::seconds(3600));
        assert!(matches!(
            auth.current_user(Some(&session.token)),
            Err(HubError::SessionExpired)
        ));
        // expired session was removed
        assert!(matches!(
            auth.current_user(Some(&session.token)),
            Err(HubError::NotLoggedIn)
        ));

        let session = auth.login("alice", &secret("secret-pw")).unwrap();
        auth.logout(&session.token).unwrap();
        auth.logout(&session.token).unwrap();
        assert!(matches!(
            auth.current_user(Some(&session.token)),
            Err(HubError::NotLoggedIn)
        ));
    }

    #[test]
    fn test_banned_user_cannot_log_in() {
        let (ctx, _) = context();
        let alice = register(&ctx, "alice");
        let auth = ctx.auth();
        let session = auth.login("alice", &secret("secret-pw")).unwrap();

        auth.set_status(&alice.id, UserStatus::Banned).unwrap();
        assert!(matches!(
            auth.login("alice", &secret("secret-pw")),
            Err(HubError::Forbidden(_))
        ));
        assert!(matches!(
            auth.current_user(Some(&session.token)),
            Err(HubError::Forbidden(_))
        ));
    }

    #[test]
    fn test_change_password() {
        let (ctx, _) = context();
        let alice = register(&ctx, "alice");
        let auth = ctx.auth();

        assert!(matches!(
            auth.change_password(&alice, &secret("nope-nope"), &secret("another-pw")),
            Err(HubError::InvalidCredentials)
        ));
        assert!(matches!(
            auth.change_password(&alice, &secret("secret-pw"), &secret("123")),
            Err(HubError::Validation(_))
        ));
        auth.change_password(&alice, &secret("secret-pw"), &secret("another-pw"))
            .unwrap();
        assert!(auth.login("alice", &secret("another-pw")).is_ok());
        assert!(auth.login("alice", &secret("secret-pw")).is_err());
    }
}
