//! Shared utility functions for type serialization and common operations.
//!
//! ## Storage Helpers
//!
//! - `ParseWithDefault` - Parse enum columns with a logged fallback
//! - `enum_to_str` - Serde name of an enum variant
//! - `to_timestamp`, `from_timestamp` - Unix seconds <-> `DateTime<Utc>`
//! - `DayWindow` - Calendar day bounds used by quotas and caps

use chrono::{DateTime, Duration, FixedOffset, NaiveTime, Offset, TimeZone, Utc};
use serde::Serialize;
use std::fmt::Display;

use crate::types::{CommentStatus, InteractionKind, PointReason, PromptStatus, UserStatus};

// =============================================================================
// Type Parsing
// =============================================================================

/// Trait for parsing strings into enum types with a default fallback.
/// Used for deserializing database values where invalid strings should fall back gracefully.
/// Logs a warning when an invalid value is encountered.
pub trait ParseWithDefault: Sized {
    /// The name of this type for logging purposes.
    fn type_name() -> &'static str;

    /// The default value to use when parsing fails.
    fn default_value() -> Self;

    /// Try to parse the string, returning None if invalid.
    fn try_parse(s: &str) -> Option<Self>;

    /// Parse a string into this type, returning a default value if parsing fails.
    /// Logs a warning for invalid values to help detect data corruption.
    fn parse_or_default(s: &str) -> Self {
        match Self::try_parse(s) {
            Some(v) => v,
            None => {
                tracing::warn!("Invalid {} value '{}', using default", Self::type_name(), s);
                Self::default_value()
            }
        }
    }
}

impl ParseWithDefault for UserStatus {
    fn type_name() -> &'static str {
        "UserStatus"
    }

    fn default_value() -> Self {
        UserStatus::Active
    }

    fn try_parse(s: &str) -> Option<Self> {
        match s {
            "active" => Some(UserStatus::Active),
            "banned" => Some(UserStatus::Banned),
            _ => None,
        }
    }
}

impl ParseWithDefault for PromptStatus {
    fn type_name() -> &'static str {
        "PromptStatus"
    }

    fn default_value() -> Self {
        PromptStatus::Published
    }

    fn try_parse(s: &str) -> Option<Self> {
        match s {
            "published" => Some(PromptStatus::Published),
            "archived" => Some(PromptStatus::Archived),
            _ => None,
        }
    }
}

impl ParseWithDefault for CommentStatus {
    fn type_name() -> &'static str {
        "CommentStatus"
    }

    fn default_value() -> Self {
        CommentStatus::Active
    }

    fn try_parse(s: &str) -> Option<Self> {
        match s {
            "active" => Some(CommentStatus::Active),
            "deleted" => Some(CommentStatus::Deleted),
            _ => None,
        }
    }
}

impl ParseWithDefault for InteractionKind {
    fn type_name() -> &'static str {
        "InteractionKind"
    }

    fn default_value() -> Self {
        InteractionKind::View
    }

    fn try_parse(s: &str) -> Option<Self> {
        match s {
            "like" => Some(InteractionKind::Like),
            "bookmark" => Some(InteractionKind::Bookmark),
            "view" => Some(InteractionKind::View),
            "share" => Some(InteractionKind::Share),
            _ => None,
        }
    }
}

impl ParseWithDefault for PointReason {
    fn type_name() -> &'static str {
        "PointReason"
    }

    fn default_value() -> Self {
        PointReason::WelcomeBonus
    }

    fn try_parse(s: &str) -> Option<Self> {
        match s {
            "welcome_bonus" => Some(PointReason::WelcomeBonus),
            "daily_login" => Some(PointReason::DailyLogin),
            "prompt_created" => Some(PointReason::PromptCreated),
            "like_received" => Some(PointReason::LikeReceived),
            "comment_created" => Some(PointReason::CommentCreated),
            "prompt_shared" => Some(PointReason::PromptShared),
            "view_charge" => Some(PointReason::ViewCharge),
            _ => None,
        }
    }
}

/// Serialize an enum to its serde string representation (without quotes).
/// Uses serde_json internally to ensure consistent serialization with
/// the `#[serde(rename_all = ...)]` attributes on enums.
pub fn enum_to_str<T: Serialize>(value: &T) -> String {
    serde_json::to_string(value)
        .unwrap_or_default()
        .trim_matches('"')
        .to_string()
}

/// Filter an iterator of Results, logging errors at debug level before discarding.
///
/// Use this instead of `.filter_map(|r| r.ok())` when you want visibility into
/// what errors are being discarded.
pub fn log_filter_error<T, E: Display>(result: Result<T, E>, context: &str) -> Option<T> {
    match result {
        Ok(v) => Some(v),
        Err(e) => {
            tracing::debug!("{}: {}", context, e);
            None
        }
    }
}

// =============================================================================
// Time
// =============================================================================

/// Unix seconds for storage
#[inline]
pub fn to_timestamp(dt: DateTime<Utc>) -> i64 {
    dt.timestamp()
}

/// Stored unix seconds back to UTC; out-of-range values clamp to the epoch
#[inline]
pub fn from_timestamp(secs: i64) -> DateTime<Utc> {
    DateTime::from_timestamp(secs, 0).unwrap_or(DateTime::UNIX_EPOCH)
}

/// Fixed offset for the given whole hours; invalid offsets fall back to UTC
fn fixed_offset(hours: i32) -> FixedOffset {
    FixedOffset::east_opt(hours * 3600).unwrap_or_else(|| Utc.fix())
}

/// Half-open `[start, end)` range of unix seconds covering one calendar day
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DayWindow {
    pub start: i64,
    pub end: i64,
    utc_offset_hours: i32,
}

impl DayWindow {
    /// Day containing `now`, with midnight at the given UTC offset
    pub fn containing(now: DateTime<Utc>, utc_offset_hours: i32) -> Self {
        let offset = fixed_offset(utc_offset_hours);
        let local_midnight = now
            .with_timezone(&offset)
            .date_naive()
            .and_time(NaiveTime::MIN);
        let start = offset
            .from_local_datetime(&local_midnight)
            .single()
            .map(|dt| dt.timestamp())
            .unwrap_or_else(|| now.timestamp() - now.timestamp().rem_euclid(86_400));
        Self {
            start,
            end: start + Duration::days(1).num_seconds(),
            utc_offset_hours,
        }
    }

    pub fn contains(&self, ts: i64) -> bool {
        ts >= self.start && ts < self.end
    }

    /// Window of the previous day
    pub fn previous(&self) -> Self {
        Self {
            start: self.start - 86_400,
            end: self.start,
            utc_offset_hours: self.utc_offset_hours,
        }
    }

    /// `YYYY-MM-DD` label of the day, used as a ledger reference
    pub fn label(&self) -> String {
        from_timestamp(self.start)
            .with_timezone(&fixed_offset(self.utc_offset_hours))
            .format("%Y-%m-%d")
            .to_string()
    }
}

// =============================================================================
// String Utilities
// =============================================================================

/// Length in characters, which is what content limits are expressed in
#[inline]
pub fn char_len(s: &str) -> usize {
    s.chars().count()
}

/// Truncate to `max` characters, appending an ellipsis when shortened
pub fn truncate_chars(s: &str, max: usize) -> String {
    if char_len(s) <= max {
        return s.to_string();
    }
    let kept: String = s.chars().take(max.saturating_sub(1)).collect();
    format!("{}…", kept.trim_end())
}
