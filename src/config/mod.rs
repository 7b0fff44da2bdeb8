//! Configuration Management
//!
//! Unified configuration system with hierarchical resolution:
//! 1. Built-in defaults
//! 2. Global config (~/.config/promptub/config.toml)
//! 3. Project config (.promptub/config.toml)
//! 4. Environment variables (PROMPTUB_SECTION__KEY)

mod loader;
mod types;

pub use loader::{ConfigLoader, PROJECT_DIR_NAME};
pub use types::*;
