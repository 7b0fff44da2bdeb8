//! Global Constants
//!
//! Centralized constants for configuration defaults and tuning.
//! All magic numbers should be defined here with documentation.

/// Points economy defaults
pub mod points {
    /// Granted once on registration
    pub const WELCOME_BONUS: i64 = 100;

    /// Reward for publishing a prompt
    pub const PROMPT_CREATED: i64 = 50;

    /// Reward paid to the author for each distinct liker
    pub const LIKE_RECEIVED: i64 = 5;

    /// Reward for writing a comment
    pub const COMMENT_CREATED: i64 = 3;

    /// Reward for sharing a prompt (once per prompt)
    pub const PROMPT_SHARED: i64 = 10;

    /// Reward for the first login of a day
    pub const DAILY_LOGIN: i64 = 5;

    /// Maximum points earnable per day from capped rewards
    pub const DAILY_LIMIT: i64 = 300;
}

/// Detail view entitlement defaults
pub mod viewing {
    /// Free detail views per day before points are charged
    pub const FREE_VIEWS_PER_DAY: u32 = 10;

    /// Points charged per view once the quota is used up
    pub const COST_PER_VIEW: i64 = 1;

    /// Offset from UTC of the daily reset
    pub const UTC_OFFSET_HOURS: i32 = 0;
}

/// Content limits (in characters)
pub mod content {
    pub const MAX_TITLE_LENGTH: usize = 100;
    pub const MAX_CONTENT_LENGTH: usize = 2000;
    pub const MAX_DESCRIPTION_LENGTH: usize = 500;
    pub const MAX_COMMENT_LENGTH: usize = 500;

    /// Maximum number of tags on one prompt
    pub const MAX_TAGS: usize = 10;

    /// Maximum characters of one tag
    pub const MAX_TAG_LENGTH: usize = 20;

    /// Feed page size when none is requested
    pub const DEFAULT_PAGE_SIZE: usize = 12;

    /// Upper bound on any requested page size
    pub const MAX_PAGE_SIZE: usize = 50;

    /// Number of search suggestions returned by default
    pub const SUGGESTION_LIMIT: usize = 5;

    /// Shortest title word offered as a suggestion
    pub const MIN_SUGGESTION_WORD: usize = 2;
}

/// Account and session defaults
pub mod security {
    pub const SESSION_TIMEOUT_SECS: u64 = 3600;
    pub const MIN_PASSWORD_LENGTH: usize = 6;
    pub const MIN_USERNAME_LENGTH: usize = 3;
    pub const MAX_USERNAME_LENGTH: usize = 30;
}

/// Card preview truncation used by the CLI feed
pub mod display {
    pub const CARD_TITLE_CHARS: usize = 30;
    pub const CARD_PREVIEW_CHARS: usize = 80;
}

/// Database constants
pub mod database {
    /// Maximum pooled connections
    pub const POOL_MAX_SIZE: u32 = 8;

    /// Busy timeout for lock contention (milliseconds)
    pub const BUSY_TIMEOUT_MS: u64 = 5000;

    /// Connection acquisition timeout (seconds)
    pub const CONNECTION_TIMEOUT_SECS: u64 = 10;

    /// Database file name inside the data directory
    pub const DB_FILE_NAME: &str = "promptub.db";
}
