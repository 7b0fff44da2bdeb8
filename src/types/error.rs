//! Unified Error Type System
//!
//! Centralized error types for the entire application.
//!
//! ## Error Categories
//!
//! - **Input**: validation failures and unknown references (fix the request)
//! - **Auth**: missing or expired sessions, bad credentials (log in again)
//! - **Economy**: insufficient points (earn points first)
//! - **System**: IO, database and configuration failures
//!
//! ## Design Principles
//!
//! - Single unified error type (HubError) for the entire application
//! - Structured error variants with context for better debugging
//! - No panic/unwrap - all errors are recoverable

use thiserror::Error;

// =============================================================================
// Error Categories
// =============================================================================

/// Error categories used by the CLI to pick hints and exit behaviour
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Invalid input or unknown entity
    Input,
    /// Authentication or authorization failure
    Auth,
    /// Not enough points for the requested action
    Economy,
    /// IO, database or configuration failure
    System,
}

impl std::fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Input => write!(f, "INPUT"),
            Self::Auth => write!(f, "AUTH"),
            Self::Economy => write!(f, "ECONOMY"),
            Self::System => write!(f, "SYSTEM"),
        }
    }
}

// =============================================================================
// Validation Error
// =============================================================================

/// Structured validation error with context
#[derive(Debug, Clone)]
pub struct ValidationError {
    /// What validation failed
    pub kind: ValidationErrorKind,
    /// Field or component that failed validation
    pub field: Option<String>,
    /// Detailed message
    pub message: String,
    /// Expected value or format
    pub expected: Option<String>,
    /// Actual value received
    pub actual: Option<String>,
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if let Some(field) = &self.field {
            write!(f, "Validation failed for '{}': {}", field, self.message)?;
        } else {
            write!(f, "Validation failed: {}", self.message)?;
        }
        if let (Some(expected), Some(actual)) = (&self.expected, &self.actual) {
            write!(f, " (expected {}, got {})", expected, actual)?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationError {}

impl ValidationError {
    /// Create a new validation error
    pub fn new(kind: ValidationErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            field: None,
            message: message.into(),
            expected: None,
            actual: None,
        }
    }

    /// Add field context
    pub fn with_field(mut self, field: impl Into<String>) -> Self {
        self.field = Some(field.into());
        self
    }

    /// Add expected/actual values
    pub fn with_comparison(
        mut self,
        expected: impl Into<String>,
        actual: impl Into<String>,
    ) -> Self {
        self.expected = Some(expected.into());
        self.actual = Some(actual.into());
        self
    }

    /// Required field is empty
    pub fn missing(field: &str) -> Self {
        Self::new(ValidationErrorKind::MissingField, "must not be empty").with_field(field)
    }

    /// Value is longer than allowed (lengths are counted in characters)
    pub fn too_long(field: &str, max: usize, actual: usize) -> Self {
        Self::new(ValidationErrorKind::Range, "is too long")
            .with_field(field)
            .with_comparison(format!("at most {} characters", max), actual.to_string())
    }

    /// Value is shorter than allowed
    pub fn too_short(field: &str, min: usize, actual: usize) -> Self {
        Self::new(ValidationErrorKind::Range, "is too short")
            .with_field(field)
            .with_comparison(format!("at least {} characters", min), actual.to_string())
    }
}

/// Validation error kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationErrorKind {
    /// Required field missing
    MissingField,
    /// Invalid format
    Format,
    /// Value out of range
    Range,
    /// Value not in the configured catalog
    UnknownValue,
    /// Consistency check failed
    Consistency,
}

// =============================================================================
// Application Error
// =============================================================================

#[derive(Debug, Error)]
pub enum HubError {
    // -------------------------------------------------------------------------
    // System Errors (auto From impl)
    // -------------------------------------------------------------------------
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Config error: {0}")]
    Config(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Not initialized: run 'promptub init' first")]
    NotInitialized,

    // -------------------------------------------------------------------------
    // Domain Errors
    // -------------------------------------------------------------------------
    #[error("{0}")]
    Validation(ValidationError),

    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    #[error("Not logged in: run 'promptub login' first")]
    NotLoggedIn,

    #[error("Session expired: please log in again")]
    SessionExpired,

    #[error("Invalid username or password")]
    InvalidCredentials,

    #[error("Username already taken: {0}")]
    UsernameTaken(String),

    #[error("Not allowed: {0}")]
    Forbidden(String),

    #[error("Insufficient points: {required} required, {available} available")]
    InsufficientPoints { required: i64, available: i64 },

    #[error("Password hashing failed: {0}")]
    PasswordHash(String),
}

impl From<ValidationError> for HubError {
    fn from(err: ValidationError) -> Self {
        HubError::Validation(err)
    }
}

impl From<argon2::password_hash::Error> for HubError {
    fn from(err: argon2::password_hash::Error) -> Self {
        HubError::PasswordHash(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, HubError>;

// =============================================================================
// Helper Functions
// =============================================================================

impl HubError {
    /// Create a not-found error for an entity
    pub fn not_found(entity: &'static str, id: impl Into<String>) -> Self {
        Self::NotFound {
            entity,
            id: id.into(),
        }
    }

    /// Create a forbidden error
    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::Forbidden(message.into())
    }

    /// Classify this error for presentation
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::Validation(_) | Self::NotFound { .. } | Self::UsernameTaken(_) => {
                ErrorCategory::Input
            }
            Self::NotLoggedIn
            | Self::SessionExpired
            | Self::InvalidCredentials
            | Self::Forbidden(_) => ErrorCategory::Auth,
            Self::InsufficientPoints { .. } => ErrorCategory::Economy,
            _ => ErrorCategory::System,
        }
    }

    /// Whether the user should (re)authenticate to proceed
    pub fn requires_login(&self) -> bool {
        matches!(self, Self::NotLoggedIn | Self::SessionExpired)
    }
}

/// Context extension trait for adding context to errors
pub trait ResultExt<T> {
    /// Add context to an error
    fn with_context<C: Into<String>>(self, context: C) -> Result<T>;

    /// Add context using a closure (lazy evaluation)
    fn with_context_fn<F, C>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> C,
        C: Into<String>;
}

impl<T, E: std::error::Error + Send + Sync + 'static> ResultExt<T> for std::result::Result<T, E> {
    fn with_context<C: Into<String>>(self, context: C) -> Result<T> {
        self.map_err(|e| HubError::Storage(format!("{}: {}", context.into(), e)))
    }

    fn with_context_fn<F, C>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> C,
        C: Into<String>,
    {
        self.map_err(|e| HubError::Storage(format!("{}: {}", f().into(), e)))
    }
}

// =============================================================================
// Tests
// =============================================================================
