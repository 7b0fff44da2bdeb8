//! Configuration Loader (Figment-based)
//!
//! Loads and merges configuration from multiple sources using Figment:
//! 1. Built-in defaults (Serialized)
//! 2. Global config (~/.config/promptub/config.toml)
//! 3. Project config (.promptub/config.toml)
//! 4. Environment variables (PROMPTUB_SECTION__KEY)

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use super::types::Config;
use crate::constants;
use crate::types::{HubError, Result};

/// Name of the per-project data directory
pub const PROJECT_DIR_NAME: &str = ".promptub";

/// Configuration loader
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration for the current directory:
    /// defaults → global → project → env vars
    pub fn load() -> Result<Config> {
        Self::load_in(Path::new("."))
    }

    /// Load configuration with `root` as the project root
    pub fn load_in(root: &Path) -> Result<Config> {
        let mut figment = Figment::new().merge(Serialized::defaults(Config::default()));

        // Merge global config
        if let Some(global_path) = Self::global_config_path()
            && global_path.exists()
        {
            debug!("Loading global config from: {}", global_path.display());
            figment = figment.merge(Toml::file(&global_path));
        }

        // Merge project config
        let project_path = Self::project_config_path(root);
        if project_path.exists() {
            debug!("Loading project config from: {}", project_path.display());
            figment = figment.merge(Toml::file(&project_path));
        }

        // Merge environment variables (e.g., PROMPTUB_VIEWING__COST_PER_VIEW -> viewing.cost_per_view)
        figment = figment.merge(Env::prefixed("PROMPTUB_").split("__").lowercase(true));

        let config: Config = figment
            .extract()
            .map_err(|e| HubError::Config(format!("Configuration error: {}", e)))?;

        // Validate configuration after loading
        config.validate()?;

        Ok(config)
    }

    /// Load configuration from a specific file only
    pub fn load_from_file(path: &Path) -> Result<Config> {
        let config: Config = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Toml::file(path))
            .extract()
            .map_err(|e| HubError::Config(format!("Configuration error: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    // =========================================================================
    // Path Management
    // =========================================================================

    /// Get path to global config directory (~/.config/promptub/)
    pub fn global_dir() -> Option<PathBuf> {
        env::var("XDG_CONFIG_HOME")
            .ok()
            .map(PathBuf::from)
            .or_else(|| {
                env::var("HOME")
                    .ok()
                    .map(|home| PathBuf::from(home).join(".config"))
            })
            .map(|p| p.join("promptub"))
    }

    /// Get path to global config file
    pub fn global_config_path() -> Option<PathBuf> {
        Self::global_dir().map(|dir| dir.join("config.toml"))
    }

    /// Project data directory under `root`
    pub fn project_dir(root: &Path) -> PathBuf {
        root.join(PROJECT_DIR_NAME)
    }

    /// Project config file under `root`
    pub fn project_config_path(root: &Path) -> PathBuf {
        Self::project_dir(root).join("config.toml")
    }

    /// Database file: configured path, or the default inside the project dir
    pub fn database_path(root: &Path, config: &Config) -> PathBuf {
        match &config.storage.database_path {
            Some(path) if path.is_absolute() => path.clone(),
            Some(path) => root.join(path),
            None => Self::project_dir(root).join(constants::database::DB_FILE_NAME),
        }
    }

    /// Check if project is initialized
    pub fn is_project_initialized(root: &Path) -> bool {
        Self::project_dir(root).exists()
    }

    // =========================================================================
    // Config Commands
    // =========================================================================

    /// Show config file paths
    pub fn show_path(root: &Path) {
        println!("Configuration paths:");
        println!();

        if let Some(global) = Self::global_config_path() {
            let exists = if global.exists() { "✓" } else { "✗" };
            println!("  Global:  {} {}", exists, global.display());
        } else {
            println!("  Global:  (not available)");
        }

        let project = Self::project_config_path(root);
        let exists = if project.exists() { "✓" } else { "✗" };
        println!("  Project: {} {}", exists, project.display());
    }

    /// Render a configuration as TOML or JSON
    pub fn render(config: &Config, as_json: bool) -> Result<String> {
        if as_json {
            Ok(serde_json::to_string_pretty(config)?)
        } else {
            toml::to_string_pretty(config).map_err(|e| HubError::Config(e.to_string()))
        }
    }

    // =========================================================================
    // Initialization
    // =========================================================================

    /// Initialize global configuration
    pub fn init_global(force: bool) -> Result<PathBuf> {
        let global_dir = Self::global_dir().ok_or_else(|| {
            HubError::Config("Cannot determine global config directory".to_string())
        })?;

        fs::create_dir_all(&global_dir)?;

        let config_path = global_dir.join("config.toml");
        if !config_path.exists() || force {
            fs::write(&config_path, Self::default_global_config())?;
            info!("Created global config: {}", config_path.display());
        } else {
            info!("Global config exists: {}", config_path.display());
        }

        Ok(config_path)
    }

    /// Initialize the project directory and its config file;
    /// `force` rewrites an existing config with the defaults
    pub fn init_project(root: &Path, force: bool) -> Result<PathBuf> {
        let project_dir = Self::project_dir(root);
        fs::create_dir_all(&project_dir)?;

        let config_path = project_dir.join("config.toml");
        if !config_path.exists() || force {
            fs::write(&config_path, Self::default_project_config())?;
            info!("Created project config: {}", config_path.display());
        }

        Ok(project_dir)
    }

    // =========================================================================
    // Internal
    // =========================================================================

    /// Generate default global config content (TOML)
    fn default_global_config() -> String {
        r#"# Promptub Global Configuration
# User-wide defaults. Settings in .promptub/config.toml override these.

version = "1.0"

[security]
session_timeout_secs = 3600
"#
        .to_string()
    }

    /// Generate default project config content (TOML)
    fn default_project_config() -> String {
        r#"# Promptub Project Configuration
# Community settings that override global defaults.

version = "1.0"

# Rewards
[points]
welcome_bonus = 100
prompt_created = 50
like_received = 5
comment_created = 3
prompt_shared = 10
daily_login = 5
daily_limit = 300

# Detail view entitlement
[viewing]
free_views_per_day = 10
level_bonus = true
cost_per_view = 1
own_prompts_free = true
utc_offset_hours = 0

# Content limits
[content]
max_title_length = 100
max_content_length = 2000
max_comment_length = 500
default_page_size = 12
"#
        .to_string()
    }
}
