//! Promptub - Community Hub for AI Prompts
//!
//! Members publish prompt cards, browse and search a shared feed, and react
//! with likes, bookmarks, shares and threaded comments. A points economy
//! rewards contributions and pays for detail views beyond a daily free quota.
//!
//! ## Quick Start
//!
//! ```ignore
//! use promptub::{Config, ServiceContext};
//! use secrecy::SecretString;
//!
//! let ctx = ServiceContext::in_memory(Config::default())?;
//! let alice = ctx.auth().register("alice", &SecretString::from("secret-pw".to_string()))?;
//! let prompt = ctx.prompts().create(&alice, new_prompt)?;
//! let detail = ctx.interactions().open_prompt(&alice, &prompt.id)?;
//! ```
//!
//! ## Modules
//!
//! - [`services`]: accounts, points ledger, prompts, interactions, comments, feed
//! - [`storage`]: SQLite persistence with connection pooling
//! - [`config`]: layered configuration
//! - [`cli`]: command handlers for the `promptub` binary

pub mod cli;
pub mod config;
pub mod constants;
pub mod services;
pub mod storage;
pub mod types;

// =============================================================================
// Core Re-exports
// =============================================================================

// Configuration
pub use config::{Config, ConfigLoader};

// Error Types
pub use types::error::{ErrorCategory, HubError, Result, ResultExt};

// Storage
pub use storage::database::PoolConfig;
pub use storage::{Database, SharedDatabase};

// Services
pub use services::{Clock, FixedClock, ServiceContext, SystemClock};
