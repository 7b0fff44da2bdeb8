//! Domain Services
//!
//! Business rules on top of the stores. Every service borrows a
//! `ServiceContext` (database, configuration, clock) and runs multi-step
//! operations inside a single database transaction.

pub mod auth;
pub mod comments;
pub mod feed;
pub mod interactions;
pub mod points;
pub mod prompts;
pub mod users;

use std::sync::{Arc, Mutex};

use chrono::{DateTime, Duration, Utc};

use rusqlite::Connection;

use crate::config::Config;
use crate::storage::{Database, PromptStore, SharedDatabase};
use crate::types::{DayWindow, HubError, Prompt, Result, User};

pub use auth::AuthService;
pub use comments::CommentService;
pub use feed::{FacetCount, FeedPage, FeedQuery, FeedService, FeedSort};
pub use interactions::InteractionService;
pub use points::PointsService;
pub use prompts::PromptService;
pub use users::UserService;

// =============================================================================
// Clock
// =============================================================================

/// Source of the current time
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Wall clock
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Manually driven clock for tests and replays
#[derive(Debug)]
pub struct FixedClock {
    now: Mutex<DateTime<Utc>>,
}

impl FixedClock {
    pub fn new(now: DateTime<Utc>) -> Self {
        Self {
            now: Mutex::new(now),
        }
    }

    pub fn set(&self, now: DateTime<Utc>) {
        let mut guard = self.now.lock().unwrap_or_else(|e| e.into_inner());
        *guard = now;
    }

    pub fn advance(&self, by: Duration) {
        let mut guard = self.now.lock().unwrap_or_else(|e| e.into_inner());
        *guard += by;
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock().unwrap_or_else(|e| e.into_inner())
    }
}

// =============================================================================
// Service Context
// =============================================================================

/// Shared dependencies of every service
#[derive(Clone)]
pub struct ServiceContext {
    pub db: SharedDatabase,
    pub config: Arc<Config>,
    clock: Arc<dyn Clock>,
}

impl ServiceContext {
    pub fn new(db: SharedDatabase, config: Arc<Config>) -> Self {
        Self {
            db,
            config,
            clock: Arc::new(SystemClock),
        }
    }

    /// Fresh in-memory database with the schema applied
    pub fn in_memory(config: Config) -> Result<Self> {
        let db = Database::open_in_memory()?;
        db.initialize()?;
        Ok(Self::new(Arc::new(db), Arc::new(config)))
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    /// Calendar day used for quotas, caps and login rewards
    pub fn today(&self) -> DayWindow {
        DayWindow::containing(self.now(), self.config.viewing.utc_offset_hours)
    }

    pub fn auth(&self) -> AuthService<'_> {
        AuthService::new(self)
    }

    pub fn points(&self) -> PointsService<'_> {
        PointsService::new(self)
    }

    pub fn prompts(&self) -> PromptService<'_> {
        PromptService::new(self)
    }

    pub fn interactions(&self) -> InteractionService<'_> {
        InteractionService::new(self)
    }

    pub fn comments(&self) -> CommentService<'_> {
        CommentService::new(self)
    }

    pub fn feed(&self) -> FeedService<'_> {
        FeedService::new(self)
    }

    pub fn users(&self) -> UserService<'_> {
        UserService::new(self)
    }
}

/// A prompt the viewer may see: published, or archived and their own.
/// Anything else reads as missing.
pub(crate) fn visible_prompt(
    conn: &Connection,
    viewer: Option<&User>,
    prompt_id: &str,
) -> Result<Prompt> {
    PromptStore::new(conn)
        .get(prompt_id)?
        .filter(|p| p.is_published() || viewer.is_some_and(|u| p.is_authored_by(&u.id)))
        .ok_or_else(|| HubError::not_found("prompt", prompt_id))
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixed_clock_advances() {
        let start = Utc::now();
        let clock = FixedClock::new(start);
        clock.advance(Duration::hours(2));
        assert_eq!(clock.now(), start + Duration::hours(2));
        clock.set(start);
        assert_eq!(clock.now(), start);
    }

    #[test]
    fn test_today_respects_offset() {
        let (ctx, clock) = testing::context();
        clock.set(chrono::TimeZone::with_ymd_and_hms(&Utc, 2026, 3, 14, 23, 0, 0).unwrap());
        let utc_day = ctx.today();

        let mut config = Config::default();
        config.viewing.utc_offset_hours = 9;
        let shifted = ServiceContext::new(ctx.db.clone(), Arc::new(config))
            .with_clock(clock.clone());
        assert_eq!(shifted.today().start, utc_day.end - 9 * 3600);
    }
}
