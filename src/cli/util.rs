//! CLI Common Utilities
//!
//! Shared initialization, session handling and output helpers for the
//! command handlers.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use secrecy::SecretString;
use serde::Serialize;
use tracing::debug;

use crate::config::{Config, ConfigLoader};
use crate::services::ServiceContext;
use crate::storage::Database;
use crate::types::{HubError, Result, ResultExt, SessionToken, User};

/// Session token file inside the project directory
pub const SESSION_FILE: &str = "session";

/// Output format of read commands
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

impl OutputFormat {
    pub fn is_json(self) -> bool {
        self == OutputFormat::Json
    }
}

/// Command execution context
///
/// Resolves the project directory, loads the layered configuration and opens
/// the database with migrations applied.
pub struct CommandContext {
    /// Project data directory (.promptub)
    pub project_dir: PathBuf,
    /// Project root directory
    pub project_root: PathBuf,
    pub services: ServiceContext,
}

impl CommandContext {
    pub fn load() -> Result<Self> {
        let project_root = std::env::current_dir()?;
        Self::load_in(&project_root)
    }

    pub fn load_in(project_root: &Path) -> Result<Self> {
        if !ConfigLoader::is_project_initialized(project_root) {
            return Err(HubError::NotInitialized);
        }
        let config = ConfigLoader::load_in(project_root)?;
        let db_path = ConfigLoader::database_path(project_root, &config);
        if !db_path.exists() {
            return Err(HubError::NotInitialized);
        }

        let db = Database::open(&db_path)?;
        db.initialize()?;

        Ok(Self {
            project_dir: ConfigLoader::project_dir(project_root),
            project_root: project_root.to_path_buf(),
            services: ServiceContext::new(Arc::new(db), Arc::new(config)),
        })
    }

    pub fn config(&self) -> &Config {
        &self.services.config
    }

    pub fn session_path(&self) -> PathBuf {
        self.project_dir.join(SESSION_FILE)
    }

    /// Token saved by the last `login`, if any
    pub fn saved_session(&self) -> Result<Option<SessionToken>> {
        let path = self.session_path();
        if !path.exists() {
            return Ok(None);
        }
        let token = fs::read_to_string(&path)
            .with_context_fn(|| format!("Failed to read {}", path.display()))?;
        let token = token.trim();
        Ok((!token.is_empty()).then(|| SessionToken::new(token)))
    }

    pub fn save_session(&self, token: &SessionToken) -> Result<()> {
        let path = self.session_path();
        fs::write(&path, token.as_str())
            .with_context_fn(|| format!("Failed to write {}", path.display()))
    }

    pub fn clear_session(&self) -> Result<()> {
        let path = self.session_path();
        if path.exists() {
            fs::remove_file(&path)?;
            debug!("Removed session file {}", path.display());
        }
        Ok(())
    }

    /// Logged-in user; a stale token file is removed
    pub fn require_user(&self) -> Result<User> {
        let token = self.saved_session()?;
        match self.services.auth().current_user(token.as_ref()) {
            Err(HubError::SessionExpired) => {
                self.clear_session()?;
                Err(HubError::SessionExpired)
            }
            other => other,
        }
    }

    /// Logged-in user, or `None` for guests
    pub fn optional_user(&self) -> Result<Option<User>> {
        match self.require_user() {
            Ok(user) => Ok(Some(user)),
            Err(HubError::NotLoggedIn | HubError::SessionExpired) => Ok(None),
            Err(e) => Err(e),
        }
    }
}

/// Create the project directory, config and database
pub fn create_database(project_root: &Path, config: &Config) -> Result<Database> {
    let db_path = ConfigLoader::database_path(project_root, config);
    if let Some(parent) = db_path.parent() {
        fs::create_dir_all(parent)?;
    }

    let db = Database::open(&db_path)?;
    db.initialize()?;
    Ok(db)
}

/// Password from the flag, or read from the terminal without echo
pub fn read_password(given: Option<String>, prompt: &str) -> Result<SecretString> {
    if let Some(password) = given {
        return Ok(SecretString::from(password));
    }
    let term = console::Term::stderr();
    term.write_str(prompt)?;
    let line = term.read_secure_line()?;
    Ok(SecretString::from(line))
}

pub fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn initialized() -> (TempDir, CommandContext) {
        let dir = TempDir::new().unwrap();
        ConfigLoader::init_project(dir.path(), false).unwrap();
        let config = ConfigLoader::load_in(dir.path()).unwrap();
        create_database(dir.path(), &config).unwrap();
        let ctx = CommandContext::load_in(dir.path()).unwrap();
        (dir, ctx)
    }

    #[test]
    fn test_load_requires_init() {
        let dir = TempDir::new().unwrap();
        assert!(matches!(
            CommandContext::load_in(dir.path()),
            Err(HubError::NotInitialized)
        ));
    }

    #[test]
    fn test_session_file_round_trip() {
        let (_dir, ctx) = initialized();
        assert!(ctx.saved_session().unwrap().is_none());
        assert!(matches!(ctx.require_user(), Err(HubError::NotLoggedIn)));
        assert!(ctx.optional_user().unwrap().is_none());

        let password = SecretString::from("secret-pw".to_string());
        ctx.services.auth().register("alice", &password).unwrap();
        let session = ctx.services.auth().login("alice", &password).unwrap();
        ctx.save_session(&session.token).unwrap();

        assert_eq!(ctx.saved_session().unwrap(), Some(session.token.clone()));
        assert_eq!(ctx.require_user().unwrap().username, "alice");

        ctx.clear_session().unwrap();
        assert!(!ctx.session_path().exists());
    }

    #[test]
    fn test_unknown_token_is_rejected() {
        let (_dir, ctx) = initialized();
        ctx.save_session(&SessionToken::new("bogus")).unwrap();
        assert!(ctx.require_user().is_err());
    }
}
