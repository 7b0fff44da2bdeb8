pub mod comment;
pub mod error;
pub mod interaction;
pub mod points;
pub mod prompt;
pub mod user;
pub mod utils;

pub use comment::*;
pub use error::{
    ErrorCategory, HubError, Result, ResultExt, ValidationError, ValidationErrorKind,
};
pub use interaction::*;
pub use points::*;
pub use prompt::*;
pub use user::*;
pub use utils::{
    DayWindow, ParseWithDefault, char_len, enum_to_str, from_timestamp, log_filter_error,
    to_timestamp, truncate_chars,
};

// =============================================================================
// Domain Newtypes
// =============================================================================

use std::fmt;

/// Type-safe wrapper for session tokens
///
/// Prevents accidental mixing of session tokens with user or prompt ids.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SessionToken(String);

impl SessionToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    /// Fresh random token
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().simple().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for SessionToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for SessionToken {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for SessionToken {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl AsRef<str> for SessionToken {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// New random entity id
pub fn new_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

#[cfg(test)]
mod newtype_tests {
    use super::*;

    #[test]
    fn test_session_token() {
        let token = SessionToken::new("sess-123");
        assert_eq!(token.as_str(), "sess-123");
        assert_eq!(format!("{}", token), "sess-123");
    }

    #[test]
    fn test_generated_tokens_are_unique() {
        let a = SessionToken::generate();
        let b = SessionToken::generate();
        assert_ne!(a, b);
        assert_eq!(a.as_str().len(), 32);
    }
}
